//! Region lifecycle: creation, intra-region block-chain walk, coalescing,
//! and the all-free check consulted on release.

use crate::block::{BlockHeader, BLOCK_HEADER_SIZE};
use crate::error::Result;
use crate::os;
use crate::size_class::Class;
use std::ptr::NonNull;

/// One OS-mapped virtual range, tiled by a doubly-linked chain of blocks.
///
/// The header lives at the start of the mapped range; `first_block`
/// points immediately after it, at `region + REGION_HEADER_SIZE`.
#[repr(C)]
pub struct RegionHeader {
  pub class: Class,
  pub total_bytes: usize,
  pub next_region: Option<NonNull<RegionHeader>>,
  pub first_block: NonNull<BlockHeader>,
}

pub const REGION_HEADER_SIZE: usize = std::mem::size_of::<RegionHeader>();

impl RegionHeader {
  /// Maps a fresh TINY/SMALL region of `class`'s fixed zone size, and
  /// installs a single free block spanning the whole payload area.
  pub fn create(class: Class) -> Result<NonNull<RegionHeader>> {
    let total_bytes = round_up_to_page(class.zone_bytes());
    let base = os::map(total_bytes)?;
    let region = base.cast::<RegionHeader>();

    let first_block =
      unsafe { NonNull::new_unchecked((region.as_ptr() as *mut u8).add(REGION_HEADER_SIZE) as *mut BlockHeader) };
    let payload_bytes = total_bytes - REGION_HEADER_SIZE - BLOCK_HEADER_SIZE;

    unsafe {
      BlockHeader::write_new(first_block, payload_bytes, true, None, None);
      region.as_ptr().write(RegionHeader {
        class,
        total_bytes,
        next_region: None,
        first_block,
      });
    }

    log::debug!(
      "region created: class={} base={:p} bytes={}",
      class.as_str(),
      region.as_ptr(),
      total_bytes
    );

    Ok(region)
  }

  /// Maps a dedicated LARGE region sized exactly to fit `aligned` bytes of
  /// payload. The sole block is marked used (not free) at construction.
  ///
  /// Unlike TINY/SMALL zones, the mapped length here is the literal
  /// `sizeof(Region_header) + sizeof(Block_header) + aligned`, not rounded
  /// up to a page multiple: a LARGE region is the one class meant to be
  /// exactly sized to its request, and `mmap`/`munmap` accept an arbitrary
  /// byte count (the kernel rounds its own mapping internally; the length
  /// reported back to the caller, and required on `unmap`, is whatever was
  /// asked for).
  pub fn create_large(aligned: usize) -> Result<NonNull<RegionHeader>> {
    let total_bytes = REGION_HEADER_SIZE + BLOCK_HEADER_SIZE + aligned;
    let base = os::map(total_bytes)?;
    let region = base.cast::<RegionHeader>();

    let first_block =
      unsafe { NonNull::new_unchecked((region.as_ptr() as *mut u8).add(REGION_HEADER_SIZE) as *mut BlockHeader) };
    let payload_bytes = aligned;

    unsafe {
      BlockHeader::write_new(first_block, payload_bytes, false, None, None);
      region.as_ptr().write(RegionHeader {
        class: Class::Large,
        total_bytes,
        next_region: None,
        first_block,
      });
    }

    log::debug!(
      "region created: class=LARGE base={:p} bytes={}",
      region.as_ptr(),
      total_bytes
    );

    Ok(region)
  }

  /// Unmaps this region. The caller must have already unlinked it from
  /// the pool.
  pub fn destroy(this: NonNull<RegionHeader>) -> Result<()> {
    let total_bytes = unsafe { (*this.as_ptr()).total_bytes };
    let class = unsafe { (*this.as_ptr()).class };
    os::unmap(this.cast::<u8>(), total_bytes)?;
    log::debug!("region released: class={} base={:p} bytes={}", class.as_str(), this.as_ptr(), total_bytes);
    Ok(())
  }

  /// Returns true iff `addr` falls strictly inside this region's payload
  /// span (i.e. excluding the region header itself).
  pub fn contains(this: NonNull<RegionHeader>, addr: *const u8) -> bool {
    let base = this.as_ptr() as usize;
    let end = base + unsafe { (*this.as_ptr()).total_bytes };
    let addr = addr as usize;
    base < addr && addr < end
  }

  /// Merges every run of consecutive free blocks in this region's chain,
  /// starting from `first_block`. Idempotent; safe to call after any
  /// single block's free flag changes.
  pub fn coalesce(this: NonNull<RegionHeader>) {
    let mut current = unsafe { (*this.as_ptr()).first_block };
    loop {
      let current_ref = unsafe { &mut *current.as_ptr() };
      let next = match current_ref.next {
        Some(n) => n,
        None => break,
      };
      let next_ref = unsafe { &*next.as_ptr() };

      if current_ref.is_free && next_ref.is_free {
        let merged_payload = current_ref.payload_bytes + BLOCK_HEADER_SIZE + next_ref.payload_bytes;
        let after_next = next_ref.next;

        log::debug!(
          "coalesce: {} + {} -> {}",
          current_ref.payload_bytes,
          next_ref.payload_bytes,
          merged_payload
        );

        current_ref.payload_bytes = merged_payload;
        current_ref.next = after_next;
        if let Some(mut after) = after_next {
          unsafe { (*after.as_ptr()).prev = Some(current) };
        }
        // Retry the same block: its new successor may also be free.
        continue;
      }

      current = next;
    }
  }

  /// True iff every block in this region's chain is free.
  pub fn all_free(this: NonNull<RegionHeader>) -> bool {
    let mut cursor = Some(unsafe { (*this.as_ptr()).first_block });
    while let Some(block) = cursor {
      let block_ref = unsafe { &*block.as_ptr() };
      if !block_ref.is_free {
        return false;
      }
      cursor = block_ref.next;
    }
    true
  }

  /// Iterates the region's block chain from `first_block`.
  pub fn blocks(this: NonNull<RegionHeader>) -> BlockIter {
    BlockIter {
      cursor: Some(unsafe { (*this.as_ptr()).first_block }),
    }
  }
}

pub struct BlockIter {
  cursor: Option<NonNull<BlockHeader>>,
}

impl Iterator for BlockIter {
  type Item = NonNull<BlockHeader>;

  fn next(&mut self) -> Option<Self::Item> {
    let current = self.cursor?;
    self.cursor = unsafe { (*current.as_ptr()).next };
    Some(current)
  }
}

fn round_up_to_page(bytes: usize) -> usize {
  crate::size_class::round_up(bytes, os::page_size())
}
