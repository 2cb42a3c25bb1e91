pub mod action;
pub mod app;
pub mod config;
pub mod event;
pub mod export;
pub mod format;
pub mod logging;
pub mod monitor;
pub mod report;
pub mod system;
pub mod ui;
