//! Pure, lock-scoped readers over the pool's state. Neither reader
//! mutates the pool; both take the pool lock for the duration of their
//! snapshot and release it before returning.

use crate::pool::POOL;
use crate::region::RegionHeader;
use crate::size_class::Class;
use std::fmt::Write as _;

/// Renders the reference `show_alloc_mem` textual dump: regions grouped
/// by class (TINY, SMALL, LARGE, in that order), sorted by base address
/// within each group, each followed by its used blocks as
/// `<start> - <end> : <N> bytes`, and a trailing `Total : <N> bytes`.
pub fn show_alloc_mem() -> String {
  let pool = POOL.lock().expect("pool mutex poisoned");
  let mut out = String::new();
  let mut total = 0usize;

  for class in [Class::Tiny, Class::Small, Class::Large] {
    let mut regions: Vec<_> = pool
      .regions()
      .filter(|r| unsafe { (*r.as_ptr()).class } == class)
      .collect();
    regions.sort_by_key(|r| r.as_ptr() as usize);

    for region in regions {
      let _ = writeln!(out, "{} : {:p}", class.as_str(), region.as_ptr());
      for block in RegionHeader::blocks(region) {
        let block_ref = unsafe { &*block.as_ptr() };
        if !block_ref.is_free {
          let start = crate::block::BlockHeader::payload_ptr(block);
          let end = unsafe { start.as_ptr().add(block_ref.payload_bytes) };
          let _ = writeln!(
            out,
            "{:p} - {:p} : {} bytes",
            start.as_ptr(),
            end,
            block_ref.payload_bytes
          );
          total += block_ref.payload_bytes;
        }
      }
    }
  }

  let _ = writeln!(out, "Total : {} bytes", total);
  out
}

/// Renders a hex dump of every used block's payload, grouped by region in
/// pool (not address) order. A supplement to `show_alloc_mem`, carried
/// over from the reference implementation's `show_alloc_mem_hex`.
pub fn show_alloc_mem_hex() -> String {
  let pool = POOL.lock().expect("pool mutex poisoned");
  let mut out = String::new();

  for region in pool.regions() {
    let class = unsafe { (*region.as_ptr()).class };
    for block in RegionHeader::blocks(region) {
      let block_ref = unsafe { &*block.as_ptr() };
      if !block_ref.is_free {
        let start = crate::block::BlockHeader::payload_ptr(block);
        let _ = writeln!(
          out,
          "{} block at {:p} - {} bytes:",
          class.as_str(),
          start.as_ptr(),
          block_ref.payload_bytes
        );
        let payload = unsafe { std::slice::from_raw_parts(start.as_ptr(), block_ref.payload_bytes) };
        for (i, chunk) in payload.chunks(16).enumerate() {
          let line_addr = unsafe { start.as_ptr().add(i * 16) };
          let _ = write!(out, "{:p}  ", line_addr);
          for byte in chunk {
            let _ = write!(out, "{:02X} ", byte);
          }
          let _ = writeln!(out);
        }
      }
    }
  }

  out
}

/// Returns the number of live, class-`class` regions currently in the
/// pool. Mostly useful for tests verifying region reclamation (e.g. that
/// no TINY regions remain after every tiny allocation is released).
pub fn region_count(class: Class) -> usize {
  let pool = POOL.lock().expect("pool mutex poisoned");
  pool
    .regions()
    .filter(|r| unsafe { (*r.as_ptr()).class } == class)
    .count()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::alloc::{allocate, release};

  #[test]
  fn show_alloc_mem_lists_used_blocks_and_totals_them() {
    let p = allocate(40);
    let dump = show_alloc_mem();
    assert!(dump.contains("TINY :"));
    assert!(dump.contains("bytes"));
    assert!(dump.contains("Total :"));
    release(p);
  }

  #[test]
  fn show_alloc_mem_hex_renders_payload_bytes() {
    let p = allocate(8);
    unsafe { std::ptr::write_bytes(p, 0xFF, 8) };
    let dump = show_alloc_mem_hex();
    assert!(dump.contains("FF"));
    release(p);
  }
}
