use ratatui::style::Color;
use ratatui::widgets::BorderType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSupport {
    Auto,
    Truecolor,
    Color256,
    Mono,
}

impl ColorSupport {
    pub fn from_config_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "truecolor" | "24bit" => ColorSupport::Truecolor,
            "256" | "256color" => ColorSupport::Color256,
            "mono" | "monochrome" => ColorSupport::Mono,
            _ => ColorSupport::Auto,
        }
    }
}

pub fn detect_color_support() -> ColorSupport {
    let colorterm = std::env::var("COLORTERM")
        .unwrap_or_default()
        .to_lowercase();
    if colorterm.contains("truecolor") || colorterm.contains("24bit") {
        return ColorSupport::Truecolor;
    }
    ColorSupport::Color256
}

pub fn resolve_color_support(config: &str) -> ColorSupport {
    let parsed = ColorSupport::from_config_str(config);
    if parsed == ColorSupport::Auto {
        detect_color_support()
    } else {
        parsed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderStyle {
    Rounded,
    Thin,
}

impl BorderStyle {
    pub fn from_config_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "thin" | "plain" => BorderStyle::Thin,
            _ => BorderStyle::Rounded,
        }
    }

    pub fn border_type(self) -> BorderType {
        match self {
            BorderStyle::Rounded => BorderType::Rounded,
            BorderStyle::Thin => BorderType::Plain,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: &'static str,
    pub header_accent_bg: Color,
    pub header_accent_fg: Color,
    pub status_ok: Color,
    pub status_err: Color,
    pub statusbar_bg: Color,
    pub overlay_border: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
    pub accent: Color,
    pub pill_key_bg: Color,
    pub pill_key_fg: Color,
    pub pill_desc_fg: Color,
    pub surface_bg: Color,
    pub gauge_filled: Color,
    pub gauge_unfilled: Color,
    pub read_color: Color,
    pub write_color: Color,
}

impl Theme {
    pub fn from_config(theme_name: &str, support: ColorSupport) -> Self {
        let mut theme = match theme_name.to_lowercase().as_str() {
            "light" => Self::light(),
            "mono" => Self::mono(),
            _ => Self::dark(),
        };

        if support == ColorSupport::Mono {
            theme = Self::mono();
        }

        theme.apply_color_support(support);
        theme
    }

    fn apply_color_support(&mut self, support: ColorSupport) {
        let map = |c: Color| adapt_color(c, support);

        self.header_accent_bg = map(self.header_accent_bg);
        self.header_accent_fg = map(self.header_accent_fg);
        self.status_ok = map(self.status_ok);
        self.status_err = map(self.status_err);
        self.statusbar_bg = map(self.statusbar_bg);
        self.overlay_border = map(self.overlay_border);
        self.text_primary = map(self.text_primary);
        self.text_secondary = map(self.text_secondary);
        self.accent = map(self.accent);
        self.pill_key_bg = map(self.pill_key_bg);
        self.pill_key_fg = map(self.pill_key_fg);
        self.pill_desc_fg = map(self.pill_desc_fg);
        self.surface_bg = map(self.surface_bg);
        self.gauge_filled = map(self.gauge_filled);
        self.gauge_unfilled = map(self.gauge_unfilled);
        self.read_color = map(self.read_color);
        self.write_color = map(self.write_color);
    }

    pub fn dark() -> Self {
        Theme {
            name: "dark",
            header_accent_bg: Color::Green,
            header_accent_fg: Color::Black,
            status_ok: Color::Green,
            status_err: Color::Red,
            statusbar_bg: Color::DarkGray,
            overlay_border: Color::DarkGray,
            text_primary: Color::White,
            text_secondary: Color::Gray,
            accent: Color::Green,
            pill_key_bg: Color::Yellow,
            pill_key_fg: Color::Black,
            pill_desc_fg: Color::White,
            surface_bg: Color::DarkGray,
            gauge_filled: Color::Rgb(103, 232, 249),
            gauge_unfilled: Color::DarkGray,
            read_color: Color::Rgb(96, 165, 250),
            write_color: Color::Rgb(251, 146, 60),
        }
    }

    pub fn light() -> Self {
        Theme {
            name: "light",
            header_accent_bg: Color::Blue,
            header_accent_fg: Color::White,
            status_ok: Color::Rgb(0, 120, 0),
            status_err: Color::Red,
            statusbar_bg: Color::Rgb(220, 220, 220),
            overlay_border: Color::Rgb(150, 150, 150),
            text_primary: Color::Black,
            text_secondary: Color::DarkGray,
            accent: Color::Blue,
            pill_key_bg: Color::Blue,
            pill_key_fg: Color::White,
            pill_desc_fg: Color::Black,
            surface_bg: Color::Rgb(200, 200, 200),
            gauge_filled: Color::Rgb(70, 130, 180),
            gauge_unfilled: Color::Rgb(200, 200, 200),
            read_color: Color::Rgb(70, 130, 180),
            write_color: Color::Rgb(200, 120, 40),
        }
    }

    pub fn mono() -> Self {
        Theme {
            name: "mono",
            header_accent_bg: Color::Black,
            header_accent_fg: Color::White,
            status_ok: Color::White,
            status_err: Color::White,
            statusbar_bg: Color::Black,
            overlay_border: Color::White,
            text_primary: Color::White,
            text_secondary: Color::Gray,
            accent: Color::White,
            pill_key_bg: Color::White,
            pill_key_fg: Color::Black,
            pill_desc_fg: Color::White,
            surface_bg: Color::Black,
            gauge_filled: Color::White,
            gauge_unfilled: Color::Black,
            read_color: Color::White,
            write_color: Color::Gray,
        }
    }
}

fn adapt_color(color: Color, support: ColorSupport) -> Color {
    match support {
        ColorSupport::Truecolor | ColorSupport::Auto => color,
        ColorSupport::Color256 => match color {
            Color::Rgb(r, g, b) => Color::Indexed(rgb_to_ansi256(r, g, b)),
            _ => color,
        },
        ColorSupport::Mono => match color {
            Color::Rgb(r, g, b) => {
                let luminance = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
                if luminance > 128.0 {
                    Color::White
                } else {
                    Color::Black
                }
            }
            Color::White | Color::Black | Color::Gray | Color::DarkGray => color,
            _ => Color::White,
        },
    }
}

fn rgb_to_ansi256(r: u8, g: u8, b: u8) -> u8 {
    let r = (r as f32 / 255.0 * 5.0).round() as u8;
    let g = (g as f32 / 255.0 * 5.0).round() as u8;
    let b = (b as f32 / 255.0 * 5.0).round() as u8;
    16 + 36 * r + 6 * g + b
}
