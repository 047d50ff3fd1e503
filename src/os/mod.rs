//! The OS mapping primitive.
//!
//! This module is the allocator's only point of contact with the operating
//! system: given a byte count it returns a pointer to a zeroed,
//! readable/writable, process-private virtual region aligned to the page,
//! or it releases a region previously returned by `map`. It carries no
//! allocator policy of its own.

#[cfg(unix)]
mod unix;

#[cfg(unix)]
pub use self::unix::{map, page_size, unmap};
