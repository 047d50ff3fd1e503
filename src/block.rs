//! The block header and the raw pointer arithmetic that ties a header to
//! its user-visible payload.
//!
//! This is the allocator's small unsafe surface: the contract "the header
//! immediately precedes the payload" is expressed here as explicit offset
//! computation against a raw address, and nowhere else. Everything above
//! this module works in terms of `NonNull<BlockHeader>`.

use std::mem;
use std::ptr::NonNull;

/// One contiguous slice of a region's payload area.
///
/// `prev`/`next` are raw addresses of sibling blocks within the same
/// region's address-ordered doubly-linked chain; they are not owning
/// references, since ownership of block storage flows from the region's
/// mapping, not from block to block.
#[repr(C)]
pub struct BlockHeader {
  pub payload_bytes: usize,
  pub is_free: bool,
  pub prev: Option<NonNull<BlockHeader>>,
  pub next: Option<NonNull<BlockHeader>>,
}

/// Size of a block header, in bytes. Guaranteed to be a multiple of eight
/// by `repr(C)` field ordering (two `usize`-aligned pointers and a
/// `usize`, with the `bool` absorbed into padding).
pub const BLOCK_HEADER_SIZE: usize = mem::size_of::<BlockHeader>();

impl BlockHeader {
  /// Writes a fresh block header at `at`, covering `payload_bytes` bytes
  /// of payload immediately after it.
  ///
  /// # Safety
  /// `at` must be valid for writes of `BLOCK_HEADER_SIZE` bytes, and the
  /// `payload_bytes` following it must belong to the same mapping.
  pub unsafe fn write_new(
    at: NonNull<BlockHeader>,
    payload_bytes: usize,
    is_free: bool,
    prev: Option<NonNull<BlockHeader>>,
    next: Option<NonNull<BlockHeader>>,
  ) {
    at.as_ptr().write(BlockHeader {
      payload_bytes,
      is_free,
      prev,
      next,
    });
  }

  /// Returns the user-visible payload pointer for this block: the first
  /// byte after the header.
  #[inline]
  pub fn payload_ptr(this: NonNull<BlockHeader>) -> NonNull<u8> {
    unsafe { NonNull::new_unchecked((this.as_ptr() as *mut u8).add(BLOCK_HEADER_SIZE)) }
  }

  /// Recovers the block header behind a payload pointer previously
  /// returned by [`BlockHeader::payload_ptr`].
  ///
  /// # Safety
  /// `payload` must be a pointer this allocator itself returned from a
  /// live block; passing an arbitrary pointer is undefined behavior, per
  /// this design's documented scope (see the crate's top-level docs).
  #[inline]
  pub unsafe fn from_payload_ptr(payload: NonNull<u8>) -> NonNull<BlockHeader> {
    NonNull::new_unchecked((payload.as_ptr() as *mut u8).sub(BLOCK_HEADER_SIZE) as *mut BlockHeader)
  }

  /// Address one-past-the-end of this block (header + payload) — i.e. the
  /// would-be address of the header of the adjacent successor.
  #[inline]
  pub fn end_ptr(this: NonNull<BlockHeader>) -> *mut u8 {
    unsafe {
      (this.as_ptr() as *mut u8)
        .add(BLOCK_HEADER_SIZE)
        .add((*this.as_ptr()).payload_bytes)
    }
  }
}
