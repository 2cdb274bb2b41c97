//! Platform capability queries
//!
//! Narrow interface over the host: CPU architecture, physical memory, and
//! free disk space. The acquirer uses the disk-space probe before starting a
//! transfer with a known size; the rest is for embedding applications that
//! gate model selection on hardware (e.g. picking a smaller artifact on
//! low-memory machines). None of this affects acquisition correctness.

use std::path::Path;

/// Whether the host CPU is 64-bit ARM (e.g. Apple Silicon)
pub fn is_arm64() -> bool {
    cfg!(target_arch = "aarch64")
}

/// Total physical memory in bytes
///
/// Uses platform-specific APIs:
/// - Unix: sysconf(_SC_PHYS_PAGES) * sysconf(_SC_PAGE_SIZE)
/// - Windows: GlobalMemoryStatusEx
pub fn total_memory_bytes() -> std::io::Result<u64> {
    #[cfg(unix)]
    {
        // SAFETY: sysconf takes no pointers; a negative return value signals
        // an unsupported query and is checked before use
        let (pages, page_size) = unsafe {
            (
                libc::sysconf(libc::_SC_PHYS_PAGES),
                libc::sysconf(libc::_SC_PAGE_SIZE),
            )
        };
        if pages < 0 || page_size < 0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok((pages as u64).saturating_mul(page_size as u64))
    }

    #[cfg(windows)]
    {
        use winapi::um::sysinfoapi::{GlobalMemoryStatusEx, MEMORYSTATUSEX};

        // SAFETY: the struct is zeroed, dwLength is set before the call, and
        // the result is only read after a successful return
        unsafe {
            let mut status: MEMORYSTATUSEX = std::mem::zeroed();
            status.dwLength = std::mem::size_of::<MEMORYSTATUSEX>() as u32;
            if GlobalMemoryStatusEx(&mut status) == 0 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(status.ullTotalPhys)
        }
    }

    #[cfg(not(any(unix, windows)))]
    {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "Memory introspection is not supported on this platform",
        ))
    }
}

/// Available disk space in bytes at the given path
///
/// Uses platform-specific APIs to query filesystem statistics:
/// - Linux/macOS: statvfs
/// - Windows: GetDiskFreeSpaceExW
pub fn available_disk_space(path: &Path) -> std::io::Result<u64> {
    #[cfg(unix)]
    {
        use std::ffi::CString;
        use std::os::unix::ffi::OsStrExt;

        // Convert path to C string for statvfs call
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        // SAFETY: c_path is a valid null-terminated C string, stat is zeroed
        // before the call, the return value is checked, and the struct is
        // only read after success
        unsafe {
            let mut stat: libc::statvfs = std::mem::zeroed();
            if libc::statvfs(c_path.as_ptr(), &mut stat) != 0 {
                return Err(std::io::Error::last_os_error());
            }

            // f_bavail is available blocks for unprivileged users,
            // f_frsize the fragment size (preferred over f_bsize)
            // Field widths differ between Linux and macOS, hence the casts
            let available_bytes = (stat.f_bavail as u64).saturating_mul(stat.f_frsize as u64);
            Ok(available_bytes)
        }
    }

    #[cfg(windows)]
    {
        use std::os::windows::ffi::OsStrExt;
        use winapi::um::fileapi::GetDiskFreeSpaceExW;

        // Convert path to wide string for Windows API
        let wide_path: Vec<u16> = path
            .as_os_str()
            .encode_wide()
            .chain(std::iter::once(0)) // null terminator
            .collect();

        // SAFETY: wide_path is a valid null-terminated wide string, all
        // output pointers reference live u64s, the return value is checked,
        // and outputs are only read after success
        unsafe {
            let mut free_bytes_available: u64 = 0;
            let mut _total_bytes: u64 = 0;
            let mut _total_free_bytes: u64 = 0;

            if GetDiskFreeSpaceExW(
                wide_path.as_ptr(),
                &mut free_bytes_available as *mut u64 as *mut _,
                &mut _total_bytes as *mut u64 as *mut _,
                &mut _total_free_bytes as *mut u64 as *mut _,
            ) == 0
            {
                return Err(std::io::Error::last_os_error());
            }

            Ok(free_bytes_available)
        }
    }

    #[cfg(not(any(unix, windows)))]
    {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "Disk space checking is not supported on this platform",
        ))
    }
}
