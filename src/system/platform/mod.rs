use crate::monitor::{CounterReadError, CounterSnapshot};

pub trait PlatformExtensions {
    /// Cumulative lifetime disk bytes read and written by `pid`.
    fn process_io(pid: u32) -> Result<CounterSnapshot, CounterReadError>;
}

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
mod windows;

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
mod unsupported {
    use super::PlatformExtensions;
    use crate::monitor::{CounterReadError, CounterSnapshot};

    pub struct Platform;

    impl PlatformExtensions for Platform {
        fn process_io(_pid: u32) -> Result<CounterSnapshot, CounterReadError> {
            Err(CounterReadError::Unsupported)
        }
    }
}

#[cfg(target_os = "linux")]
use linux as platform_impl;
#[cfg(target_os = "macos")]
use macos as platform_impl;
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
use unsupported as platform_impl;
#[cfg(target_os = "windows")]
use windows as platform_impl;

pub fn process_io(pid: u32) -> Result<CounterSnapshot, CounterReadError> {
    platform_impl::Platform::process_io(pid)
}
