// Named regions under /dev/shm, mapped MAP_SHARED so every process (and
// every core running one) that maps the same name sees the same queue memory

use std::fmt::Debug;
use std::io;

/// A mapped region both sides of a queue can see.
pub trait SharedMemoryBackend: Send + Sync + Debug {
    /// Start of the mapping. Page aligned.
    fn as_ptr(&self) -> *mut u8;

    /// Length of the mapping in bytes
    fn size(&self) -> usize;

    /// OS handle behind the mapping
    fn raw_handle(&self) -> RawHandle;
}

/// Platform-specific handle type
#[derive(Debug, Clone, Copy)]
pub enum RawHandle {
    /// Unix file descriptor (Linux)
    Fd(i32),
}

/// Path of a named region under `/dev/shm`.
pub fn region_path(name: &str) -> String {
    format!("/dev/shm/{}", name.trim_start_matches('/'))
}

/// Create (or truncate) a named shared memory region of `size` bytes.
///
/// The contents start zeroed.
pub fn create_shared_memory(name: &str, size: usize) -> io::Result<Box<dyn SharedMemoryBackend>> {
    #[cfg(target_os = "linux")]
    return Ok(Box::new(ShmRegion::create(name, size)?));

    #[cfg(not(target_os = "linux"))]
    {
        let _ = (name, size);
        Err(unsupported())
    }
}

/// Attach to an existing named region that is at least `min_size` bytes.
/// The whole file is mapped, whatever its size.
pub fn attach_shared_memory(name: &str, min_size: usize) -> io::Result<Box<dyn SharedMemoryBackend>> {
    #[cfg(target_os = "linux")]
    return Ok(Box::new(ShmRegion::attach(name, min_size)?));

    #[cfg(not(target_os = "linux"))]
    {
        let _ = (name, min_size);
        Err(unsupported())
    }
}

/// Remove the name of a region. Existing mappings stay valid; a name that is
/// already gone is not an error.
pub fn unlink_shared_memory(name: &str) -> io::Result<()> {
    #[cfg(target_os = "linux")]
    return match std::fs::remove_file(region_path(name)) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    };

    #[cfg(not(target_os = "linux"))]
    {
        let _ = name;
        Err(unsupported())
    }
}

#[cfg(not(target_os = "linux"))]
fn unsupported() -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        "named shared memory regions need /dev/shm (Linux only)",
    )
}

#[cfg(target_os = "linux")]
pub use linux::ShmRegion;

#[cfg(target_os = "linux")]
mod linux {
    use super::{region_path, RawHandle, SharedMemoryBackend};
    use crate::trace::{debug, warn};
    use std::fs::{File, OpenOptions};
    use std::io;
    use std::os::fd::AsRawFd;
    use std::os::unix::fs::OpenOptionsExt;
    use std::ptr::{self, NonNull};

    /// One `/dev/shm` file mapped read-write and shared.
    ///
    /// The file stays open for as long as the mapping exists and is closed
    /// after the unmap in `Drop`.
    #[derive(Debug)]
    pub struct ShmRegion {
        base: NonNull<u8>,
        len: usize,
        file: File,
    }

    // Plain shared bytes; every access that races goes through the atomics
    // laid out inside the region.
    unsafe impl Send for ShmRegion {}
    unsafe impl Sync for ShmRegion {}

    impl ShmRegion {
        pub fn create(name: &str, len: usize) -> io::Result<Self> {
            if len == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "region length must be non-zero",
                ));
            }
            let path = region_path(name);
            let file = open(&path, true)?;
            // Truncated on open, so the grown file reads back as zeros
            file.set_len(len as u64)?;

            let region = Self::map(file, len)?;
            debug!(%path, len, "shm region created");
            Ok(region)
        }

        pub fn attach(name: &str, min_len: usize) -> io::Result<Self> {
            let path = region_path(name);
            let file = open(&path, false)?;

            let len = file.metadata()?.len() as usize;
            if len == 0 || len < min_len {
                warn!(%path, len, min_len, "shm region shorter than required");
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("region {path} is {len} bytes, need at least {min_len}"),
                ));
            }

            let region = Self::map(file, len)?;
            debug!(%path, len, "shm region attached");
            Ok(region)
        }

        fn map(file: File, len: usize) -> io::Result<Self> {
            let addr = unsafe {
                libc::mmap(
                    ptr::null_mut(),
                    len,
                    libc::PROT_READ | libc::PROT_WRITE,
                    libc::MAP_SHARED,
                    file.as_raw_fd(),
                    0,
                )
            };
            if addr == libc::MAP_FAILED {
                return Err(io::Error::last_os_error());
            }
            let base = NonNull::new(addr.cast::<u8>())
                .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "mmap returned null"))?;
            Ok(Self { base, len, file })
        }
    }

    fn open(path: &str, create: bool) -> io::Result<File> {
        let mut options = OpenOptions::new();
        options.read(true).write(true);
        if create {
            options.create(true).truncate(true).mode(0o600);
        }
        options.open(path).map_err(|e| {
            let verb = if create { "create" } else { "open" };
            io::Error::new(e.kind(), format!("cannot {verb} shm region {path}: {e}"))
        })
    }

    impl Drop for ShmRegion {
        fn drop(&mut self) {
            unsafe {
                libc::munmap(self.base.as_ptr().cast::<libc::c_void>(), self.len);
            }
        }
    }

    impl SharedMemoryBackend for ShmRegion {
        fn as_ptr(&self) -> *mut u8 {
            self.base.as_ptr()
        }

        fn size(&self) -> usize {
            self.len
        }

        fn raw_handle(&self) -> RawHandle {
            RawHandle::Fd(self.file.as_raw_fd())
        }
    }
}
