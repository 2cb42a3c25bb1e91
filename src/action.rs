#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,
    StartRun,
    StopRun,
    Export,
    ToggleMode,
    EnterEdit,
    NextField,
    UpdateEdit(String),
    ApplyEdit,
    CancelEdit,
    ToggleHelp,
    None,
}
