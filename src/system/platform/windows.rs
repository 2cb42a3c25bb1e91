use windows_sys::Win32::{
    Foundation::{CloseHandle, ERROR_ACCESS_DENIED, GetLastError},
    System::Threading::{
        GetProcessIoCounters, IO_COUNTERS, OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION,
    },
};

use super::PlatformExtensions;
use crate::monitor::{CounterReadError, CounterSnapshot};

pub struct Platform;

impl PlatformExtensions for Platform {
    fn process_io(pid: u32) -> Result<CounterSnapshot, CounterReadError> {
        // Transfer counts cover all I/O the process issued, not only disk.
        unsafe {
            let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, 0, pid);
            if handle.is_null() {
                return Err(classify_last_error());
            }
            let mut counters = std::mem::zeroed::<IO_COUNTERS>();
            let ok = GetProcessIoCounters(handle, &mut counters);
            let err = if ok == 0 {
                Some(classify_last_error())
            } else {
                None
            };
            CloseHandle(handle);
            match err {
                Some(err) => Err(err),
                None => Ok(CounterSnapshot::new(
                    counters.ReadTransferCount,
                    counters.WriteTransferCount,
                )),
            }
        }
    }
}

unsafe fn classify_last_error() -> CounterReadError {
    if unsafe { GetLastError() } == ERROR_ACCESS_DENIED {
        CounterReadError::AccessDenied
    } else {
        CounterReadError::ProcessGone
    }
}
