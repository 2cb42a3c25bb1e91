use libproc::libproc::pid_rusage::{RUsageInfoV2, pidrusage};

use super::PlatformExtensions;
use crate::monitor::{CounterReadError, CounterSnapshot};

pub struct Platform;

impl PlatformExtensions for Platform {
    fn process_io(pid: u32) -> Result<CounterSnapshot, CounterReadError> {
        match pidrusage::<RUsageInfoV2>(pid as i32) {
            Ok(info) => Ok(CounterSnapshot::new(
                info.ri_diskio_bytesread,
                info.ri_diskio_byteswritten,
            )),
            Err(_) => Err(classify_failure(pid)),
        }
    }
}

/// proc_pid_rusage only reports a message, so probe the pid with signal 0 to
/// tell an exited process from one we may not inspect.
fn classify_failure(pid: u32) -> CounterReadError {
    let rc = unsafe { libc::kill(pid as libc::pid_t, 0) };
    if rc == 0 {
        return CounterReadError::AccessDenied;
    }
    match std::io::Error::last_os_error().raw_os_error() {
        Some(libc::ESRCH) => CounterReadError::ProcessGone,
        _ => CounterReadError::AccessDenied,
    }
}
