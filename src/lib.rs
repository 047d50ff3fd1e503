//! A size-classed, region-based dynamic memory allocator.
//!
//! This crate provides a drop-in replacement for `malloc`/`free`/`realloc`.
//! It satisfies allocation requests by obtaining raw virtual-memory pages
//! from the operating system (see [`os`]) and partitioning those pages into
//! user-visible blocks managed by its own bookkeeping.
//!
//! Requests are classified into three region classes by aligned size:
//! TINY (≤ 64 B), SMALL (≤ 1024 B), and LARGE (everything else). TINY and
//! SMALL payloads share multi-block regions sized to a fixed multiple of
//! the system page size; every LARGE payload gets a dedicated, exactly-sized
//! region. A region is returned to the OS the moment every block inside it
//! is free (immediately, for LARGE).
//!
//! All three public operations serialize on a single process-wide mutex
//! (see [`pool`]); there is no per-thread caching or arena splitting.
//!
//! # Examples
//!
//! ```
//! let p = mallocore::allocate(64);
//! assert!(!p.is_null());
//! unsafe {
//!   *p = 0x42;
//!   assert_eq!(*p, 0x42);
//! }
//! mallocore::release(p);
//! ```

pub use alloc::{allocate, release, resize};
pub use diagnostics::{show_alloc_mem, show_alloc_mem_hex};
pub use error::{Error, Result};

mod alloc;
mod block;
mod diagnostics;
mod error;
#[cfg(feature = "libc-shim")]
mod ffi;
mod os;
mod placement;
mod pool;
mod region;
mod size_class;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn smoke_allocate_release() {
    let p = allocate(16);
    assert!(!p.is_null());
    release(p);
  }
}
