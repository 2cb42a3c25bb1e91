use std::io;

use super::PlatformExtensions;
use crate::monitor::{CounterReadError, CounterSnapshot};

pub struct Platform;

impl PlatformExtensions for Platform {
    fn process_io(pid: u32) -> Result<CounterSnapshot, CounterReadError> {
        // Other users' processes answer EACCES unless we hold CAP_SYS_PTRACE.
        let path = format!("/proc/{pid}/io");
        let contents = std::fs::read_to_string(path).map_err(classify)?;
        parse_proc_io(&contents).ok_or(CounterReadError::Unsupported)
    }
}

fn classify(err: io::Error) -> CounterReadError {
    match err.kind() {
        io::ErrorKind::NotFound => CounterReadError::ProcessGone,
        io::ErrorKind::PermissionDenied => CounterReadError::AccessDenied,
        // A vanished pid normally reads as ENOENT. ESRCH is rare and only shows
        // up when the task exits while its io file is being read.
        _ if err.raw_os_error() == Some(libc::ESRCH) => CounterReadError::ProcessGone,
        _ => CounterReadError::AccessDenied,
    }
}

/// `read_bytes`/`write_bytes` are the bytes that actually hit the storage layer,
/// unlike `rchar`/`wchar` which include page-cache hits.
fn parse_proc_io(contents: &str) -> Option<CounterSnapshot> {
    let mut read_bytes = None;
    let mut write_bytes = None;
    for line in contents.lines() {
        if let Some(val) = line.strip_prefix("read_bytes:") {
            read_bytes = val.trim().parse().ok();
        } else if let Some(val) = line.strip_prefix("write_bytes:") {
            write_bytes = val.trim().parse().ok();
        }
    }
    Some(CounterSnapshot::new(read_bytes?, write_bytes?))
}
