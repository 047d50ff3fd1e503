//! An `extern "C"` shim with the platform allocator's historical
//! signatures, so this crate's pool can be linked in wherever a
//! `malloc`-shaped symbol is expected. Gated behind the `libc-shim`
//! feature; it is a direct, panic-free translation to the three core
//! operations and carries no policy of its own.

use libc::{c_void, size_t};

/// # Safety
/// Same contract as the platform's `malloc`: the returned pointer, if
/// non-null, must eventually be passed to [`free`] (or [`realloc`]) and
/// nowhere else.
#[no_mangle]
pub unsafe extern "C" fn malloc(size: size_t) -> *mut c_void {
  crate::allocate(size as usize) as *mut c_void
}

/// # Safety
/// `ptr` must be null or a pointer previously returned by [`malloc`] or
/// [`realloc`] from this allocator, not yet freed.
#[no_mangle]
pub unsafe extern "C" fn free(ptr: *mut c_void) {
  crate::release(ptr as *mut u8)
}

/// # Safety
/// Same contract as the platform's `realloc`.
#[no_mangle]
pub unsafe extern "C" fn realloc(ptr: *mut c_void, size: size_t) -> *mut c_void {
  crate::resize(ptr as *mut u8, size as usize) as *mut c_void
}
