//! Request classification and alignment.

use crate::os;

/// Requests this big or smaller share TINY regions.
pub const TINY_MAX: usize = 64;
/// Requests this big or smaller (but bigger than [`TINY_MAX`]) share SMALL regions.
pub const SMALL_MAX: usize = 1024;

/// TINY regions are this many pages.
pub const TINY_ZONE_PAGES: usize = 16;
/// SMALL regions are this many pages.
pub const SMALL_ZONE_PAGES: usize = 128;

/// The region class a request falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
  Tiny,
  Small,
  Large,
}

impl Class {
  /// Classifies an already-aligned payload size.
  pub fn of_aligned(aligned: usize) -> Class {
    if aligned <= TINY_MAX {
      Class::Tiny
    } else if aligned <= SMALL_MAX {
      Class::Small
    } else {
      Class::Large
    }
  }

  /// The fixed region size (in bytes) used for a multi-block region of this
  /// class. Not meaningful for [`Class::Large`], whose region is sized to
  /// fit exactly one request (see `Region::create_large`).
  pub fn zone_bytes(self) -> usize {
    let pages = match self {
      Class::Tiny => TINY_ZONE_PAGES,
      Class::Small => SMALL_ZONE_PAGES,
      Class::Large => unreachable!("LARGE regions are not fixed-size zones"),
    };
    pages * os::page_size()
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Class::Tiny => "TINY",
      Class::Small => "SMALL",
      Class::Large => "LARGE",
    }
  }
}

/// Rounds `n` up to the next multiple of `align` (`align` must be a power of two).
#[inline]
pub fn round_up(n: usize, align: usize) -> usize {
  (n + align - 1) & !(align - 1)
}

/// Maps a requested byte count to its aligned size and region class.
///
/// A request of zero is coerced to one byte, so that the allocator still
/// hands back a distinct, releasable pointer.
pub fn classify(requested: usize) -> (usize, Class) {
  let aligned = round_up(requested.max(1), 8);
  (aligned, Class::of_aligned(aligned))
}
