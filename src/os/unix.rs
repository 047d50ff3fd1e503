use crate::error::{Error, Result};
use std::io;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

// Cached lazily: the page size never changes for the lifetime of a process,
// but we don't know its value at compile time.
static PAGE_SIZE: AtomicUsize = AtomicUsize::new(0);

/// Returns the operating system's page size, in bytes.
#[inline]
pub fn page_size() -> usize {
  let cached = PAGE_SIZE.load(Ordering::Relaxed);
  if cached != 0 {
    return cached;
  }

  let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
  PAGE_SIZE.store(size, Ordering::Relaxed);
  size
}

/// Maps a new, zeroed, process-private, read/write virtual region of
/// exactly `bytes` bytes.
///
/// `bytes` need not be a multiple of the page size: `mmap` accepts any
/// length and rounds its own allocation up internally, while still
/// reporting the mapping as `bytes` long to the caller. Whether to round
/// up before calling is a policy decision left to the callers in
/// `size_class`/`region`; TINY/SMALL zones round to fill a fixed page
/// count, LARGE regions do not.
pub fn map(bytes: usize) -> Result<NonNull<u8>> {
  let addr = unsafe {
    libc::mmap(
      std::ptr::null_mut(),
      bytes,
      libc::PROT_READ | libc::PROT_WRITE,
      libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
      -1,
      0,
    )
  };

  if addr == libc::MAP_FAILED {
    return Err(Error::SystemCall(io::Error::last_os_error()));
  }

  // Anonymous mappings are zero-filled by the kernel; MAP_ANONYMOUS
  // guarantees this, so no explicit zeroing is needed here.
  Ok(unsafe { NonNull::new_unchecked(addr as *mut u8) })
}

/// Releases a region previously returned by [`map`]. `bytes` must be the
/// exact size that was passed to the corresponding `map` call.
pub fn unmap(base: NonNull<u8>, bytes: usize) -> Result<()> {
  let result = unsafe { libc::munmap(base.as_ptr() as *mut libc::c_void, bytes) };
  if result != 0 {
    return Err(Error::SystemCall(io::Error::last_os_error()));
  }
  Ok(())
}
