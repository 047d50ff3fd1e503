//! The three public operations: `allocate`, `release`, `resize`. Each
//! acquires the pool lock exactly once and releases it on every exit
//! path, translating internal `Result<_, Error>` failures into the
//! documented null/no-op ABI.

use crate::block::BlockHeader;
use crate::error::{Error, Result};
use crate::placement;
use crate::pool::{Pool, POOL};
use crate::region::RegionHeader;
use crate::size_class::{self, Class};
use std::ptr::NonNull;

/// Allocates `n` bytes and returns a pointer to the new, eight-byte
/// aligned payload, or null if the OS mapping primitive failed.
///
/// `n == 0` is coerced to a one-byte allocation; see [`size_class::classify`].
pub fn allocate(n: usize) -> *mut u8 {
  let mut pool = lock_pool();
  match allocate_locked(&mut pool, n) {
    Ok(ptr) => ptr.as_ptr(),
    Err(err) => {
      log::warn!("allocate({}) failed: {}", n, err);
      std::ptr::null_mut()
    }
  }
}

/// Frees the memory block pointed to by `ptr`. `ptr == null` is a no-op.
/// A pointer that does not belong to any live region is also silently
/// ignored (this also absorbs the common double-free case, since the
/// first release already unmapped the region).
pub fn release(ptr: *mut u8) {
  let ptr = match NonNull::new(ptr) {
    Some(ptr) => ptr,
    None => return,
  };

  let mut pool = lock_pool();
  if let Err(err) = release_locked(&mut pool, ptr) {
    log::debug!("release({:p}) ignored: {}", ptr.as_ptr(), err);
  }
}

/// Resizes the allocation behind `ptr` to `n` bytes.
///
/// `resize(null, n)` behaves as `allocate(n)`. `resize(p, 0)` behaves as
/// `release(p)` and returns null. Otherwise, grows/shrinks in place when
/// the existing block has room, or allocates fresh, copies, and frees
/// the old block.
pub fn resize(ptr: *mut u8, n: usize) -> *mut u8 {
  let mut pool = lock_pool();

  let ptr = match NonNull::new(ptr) {
    Some(ptr) => ptr,
    None => {
      return match allocate_locked(&mut pool, n) {
        Ok(ptr) => ptr.as_ptr(),
        Err(err) => {
          log::warn!("resize(null, {}) failed: {}", n, err);
          std::ptr::null_mut()
        }
      }
    }
  };

  if n == 0 {
    if let Err(err) = release_locked(&mut pool, ptr) {
      log::debug!("resize({:p}, 0) ignored: {}", ptr.as_ptr(), err);
    }
    return std::ptr::null_mut();
  }

  match resize_locked(&mut pool, ptr, n) {
    Ok(new_ptr) => new_ptr.as_ptr(),
    Err(err) => {
      log::warn!("resize({:p}, {}) failed: {}", ptr.as_ptr(), n, err);
      std::ptr::null_mut()
    }
  }
}

fn lock_pool() -> std::sync::MutexGuard<'static, Pool> {
  // A poisoned pool mutex means some prior call panicked while holding
  // it, which this crate's own code never does on the documented API
  // surface. Treat it as unrecoverable rather than silently continuing
  // over a possibly-torn pool.
  POOL.lock().expect("pool mutex poisoned")
}

fn allocate_locked(pool: &mut Pool, n: usize) -> Result<NonNull<u8>> {
  let (aligned, class) = size_class::classify(n);
  match class {
    Class::Large => {
      let region = RegionHeader::create_large(aligned)?;
      pool.prepend(region);
      Ok(BlockHeader::payload_ptr(unsafe { (*region.as_ptr()).first_block }))
    }
    _ => placement::allocate_in_class(pool, class, aligned),
  }
}

fn release_locked(pool: &mut Pool, ptr: NonNull<u8>) -> Result<()> {
  let region = pool
    .region_for_ptr(ptr.as_ptr())
    .ok_or(Error::UnmappedRegion)?;
  let block = unsafe { BlockHeader::from_payload_ptr(ptr) };

  unsafe { (*block.as_ptr()).is_free = true };

  let class = unsafe { (*region.as_ptr()).class };
  if class == Class::Large {
    pool.unlink(region);
    return RegionHeader::destroy(region);
  }

  RegionHeader::coalesce(region);
  if RegionHeader::all_free(region) {
    pool.unlink(region);
    RegionHeader::destroy(region)?;
  }
  Ok(())
}

fn resize_locked(pool: &mut Pool, ptr: NonNull<u8>, n: usize) -> Result<NonNull<u8>> {
  let block = unsafe { BlockHeader::from_payload_ptr(ptr) };
  let (aligned, _class) = size_class::classify(n);
  let current_payload = unsafe { (*block.as_ptr()).payload_bytes };
  let region = pool.region_for_ptr(ptr.as_ptr());
  let region_class = region.map(|r| unsafe { (*r.as_ptr()).class });

  if current_payload >= aligned {
    // A LARGE region's sole block must stay whole (invariant: a LARGE
    // region always contains exactly one, non-free block) — splitting it
    // here would leave a second, free block in a region whose size was
    // never meant to host more than one. Shrinking a LARGE allocation in
    // place is accepted as extra internal fragmentation instead.
    if region_class != Some(Class::Large) {
      placement::split_and_claim(block, aligned);
      // Shrinking a used block can carve a fresh free tail whose
      // successor was already free (unlike placement's split, which
      // only ever splits a block that was itself free, and so never had
      // a free neighbor in the first place). Re-establish the
      // no-two-consecutive-frees invariant before handing back.
      if let Some(region) = region {
        RegionHeader::coalesce(region);
      }
    }
    return Ok(ptr);
  }

  let new_ptr = allocate_locked(pool, n)?;
  unsafe {
    std::ptr::copy_nonoverlapping(ptr.as_ptr(), new_ptr.as_ptr(), current_payload.min(aligned));
  }
  // release_locked cannot fail with UnmappedRegion here: `ptr` was just
  // resolved to `block`'s region above.
  release_locked(pool, ptr)?;
  Ok(new_ptr)
}
