//! First-fit placement and splitting, shared by `allocate` and the
//! in-place branch of `resize`.

use crate::block::{BlockHeader, BLOCK_HEADER_SIZE};
use crate::error::Result;
use crate::pool::Pool;
use crate::region::RegionHeader;
use crate::size_class::Class;
use std::ptr::NonNull;

/// Finds a free block of at least `aligned` bytes in a region of `class`,
/// creating a new region if none fits. Splits the winning block when a
/// useful tail remains. Returns the (now used) block's payload pointer.
pub fn allocate_in_class(pool: &mut Pool, class: Class, aligned: usize) -> Result<NonNull<u8>> {
  let block = match find_fit(pool, class, aligned) {
    Some(block) => block,
    None => {
      let region = RegionHeader::create(class)?;
      pool.prepend(region);
      unsafe { (*region.as_ptr()).first_block }
    }
  };

  split_and_claim(block, aligned);
  Ok(BlockHeader::payload_ptr(block))
}

/// Scans the pool for the first free, class-matching block large enough
/// for `aligned` bytes.
fn find_fit(pool: &Pool, class: Class, aligned: usize) -> Option<NonNull<BlockHeader>> {
  for region in pool.regions() {
    if unsafe { (*region.as_ptr()).class } != class {
      continue;
    }
    for block in RegionHeader::blocks(region) {
      let block_ref = unsafe { &*block.as_ptr() };
      if block_ref.is_free && block_ref.payload_bytes >= aligned {
        return Some(block);
      }
    }
  }
  None
}

/// Carves `block` down to exactly `aligned` bytes of payload when the
/// remainder is large enough to be useful, splicing the new free tail
/// into the chain; otherwise hands out the whole block. Marks `block`
/// used either way.
pub fn split_and_claim(mut block: NonNull<BlockHeader>, aligned: usize) {
  let block_ref = unsafe { &mut *block.as_ptr() };
  let remainder = block_ref.payload_bytes;

  if remainder >= aligned + BLOCK_HEADER_SIZE + 8 {
    let tail_payload = remainder - aligned - BLOCK_HEADER_SIZE;
    let tail_ptr = unsafe {
      NonNull::new_unchecked((block.as_ptr() as *mut u8).add(BLOCK_HEADER_SIZE).add(aligned) as *mut BlockHeader)
    };
    let former_next = block_ref.next;

    unsafe {
      BlockHeader::write_new(tail_ptr, tail_payload, true, Some(block), former_next);
    }
    if let Some(mut next) = former_next {
      unsafe { (*next.as_ptr()).prev = Some(tail_ptr) };
    }

    log::debug!(
      "split: {} -> used {} + free {}",
      remainder,
      aligned,
      tail_payload
    );

    block_ref.next = Some(tail_ptr);
    block_ref.payload_bytes = aligned;
  }

  block_ref.is_free = false;
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pool::Pool;
  use crate::region::RegionHeader;

  fn fresh_pool_with_region(class: Class) -> (Pool, NonNull<RegionHeader>) {
    let mut pool = Pool::new();
    let region = RegionHeader::create(class).unwrap();
    pool.prepend(region);
    (pool, region)
  }

  #[test]
  fn allocate_splits_a_large_free_block() {
    let (mut pool, region) = fresh_pool_with_region(Class::Tiny);
    let before = unsafe { (*(*region.as_ptr()).first_block.as_ptr()).payload_bytes };

    let ptr = allocate_in_class(&mut pool, Class::Tiny, 32).unwrap();
    let block = unsafe { BlockHeader::from_payload_ptr(ptr) };
    let block_ref = unsafe { &*block.as_ptr() };
    assert!(!block_ref.is_free);
    assert_eq!(block_ref.payload_bytes, 32);
    assert!(block_ref.next.is_some());

    let tail = unsafe { &*block_ref.next.unwrap().as_ptr() };
    assert!(tail.is_free);
    assert_eq!(tail.payload_bytes, before - 32 - BLOCK_HEADER_SIZE);

    RegionHeader::destroy(region).unwrap();
  }

  #[test]
  fn allocate_reuses_existing_region_before_creating_a_new_one() {
    let (mut pool, region) = fresh_pool_with_region(Class::Tiny);
    let _p1 = allocate_in_class(&mut pool, Class::Tiny, 32).unwrap();
    assert_eq!(pool.regions().count(), 1);
    let _p2 = allocate_in_class(&mut pool, Class::Tiny, 32).unwrap();
    assert_eq!(pool.regions().count(), 1);

    RegionHeader::destroy(region).unwrap();
  }
}
