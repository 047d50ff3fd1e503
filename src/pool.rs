//! The process-wide pool: a singly-linked list of live regions, guarded
//! by a single mutex. Lazily initialized, never torn down — the same
//! shape as a `lazy_static! { static ref ALLPAGES: ... }` global.

use crate::region::RegionHeader;
use lazy_static::lazy_static;
use std::ptr::NonNull;
use std::sync::Mutex;

pub struct Pool {
  head: Option<NonNull<RegionHeader>>,
}

// The pool only ever hands out region/block pointers under the protection
// of `POOL`'s mutex; the raw pointers it stores are not otherwise shared
// across threads outside of that lock.
unsafe impl Send for Pool {}

lazy_static! {
  pub static ref POOL: Mutex<Pool> = Mutex::new(Pool::new());
}

impl Pool {
  pub(crate) fn new() -> Pool {
    Pool { head: None }
  }

  /// Prepends a freshly created region to the pool. The list order is
  /// never relied upon for correctness.
  pub fn prepend(&mut self, mut region: NonNull<RegionHeader>) {
    unsafe {
      (*region.as_ptr()).next_region = self.head;
    }
    self.head = Some(region);
  }

  /// Unlinks `region` from the pool. `region` must currently be a member.
  pub fn unlink(&mut self, region: NonNull<RegionHeader>) {
    if self.head == Some(region) {
      self.head = unsafe { (*region.as_ptr()).next_region };
      return;
    }

    let mut prev = self.head;
    while let Some(candidate) = prev {
      let next = unsafe { (*candidate.as_ptr()).next_region };
      if next == Some(region) {
        unsafe { (*candidate.as_ptr()).next_region = (*region.as_ptr()).next_region };
        return;
      }
      prev = next;
    }
  }

  /// Returns the region owning `addr`, if any currently live region
  /// claims it. Strict inequality on the lower bound: the region base
  /// itself is the header, not a user payload.
  pub fn region_for_ptr(&self, addr: *const u8) -> Option<NonNull<RegionHeader>> {
    let mut cursor = self.head;
    while let Some(region) = cursor {
      if RegionHeader::contains(region, addr) {
        return Some(region);
      }
      cursor = unsafe { (*region.as_ptr()).next_region };
    }
    None
  }

  /// Iterates every region currently in the pool, in list (not address)
  /// order.
  pub fn regions(&self) -> RegionIter {
    RegionIter { cursor: self.head }
  }
}

pub struct RegionIter {
  cursor: Option<NonNull<RegionHeader>>,
}

impl Iterator for RegionIter {
  type Item = NonNull<RegionHeader>;

  fn next(&mut self) -> Option<Self::Item> {
    let current = self.cursor?;
    self.cursor = unsafe { (*current.as_ptr()).next_region };
    Some(current)
  }
}
