//! End-to-end scenarios and cross-cutting invariants against the shared,
//! process-wide allocator. Every test serializes on `guard()` because
//! `cargo test` otherwise runs these in parallel threads inside the same
//! process, all sharing one global pool — exactly the condition this
//! crate's single mutex is meant to handle correctly, but scenario
//! assertions like "no TINY regions remain" only hold if nothing else is
//! concurrently allocating TINY memory underneath them.

use mallocore::{allocate, release, resize, show_alloc_mem};
use std::sync::Mutex;

static TEST_LOCK: Mutex<()> = Mutex::new(());

fn guard() -> std::sync::MutexGuard<'static, ()> {
  let _ = env_logger::builder().is_test(true).try_init();
  TEST_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_pattern(ptr: *mut u8, len: usize, byte: u8) {
  unsafe { std::ptr::write_bytes(ptr, byte, len) };
}

fn assert_pattern(ptr: *mut u8, len: usize, byte: u8) {
  for i in 0..len {
    assert_eq!(unsafe { *ptr.add(i) }, byte, "byte {} mismatched", i);
  }
}

/// S1 — a zero-size request returns a distinct, writable, releasable
/// pointer, and freeing it does not disturb later allocations.
#[test]
fn s1_zero_byte_allocation() {
  let _g = guard();

  let q = allocate(0);
  assert!(!q.is_null());
  unsafe { *q = 0x5A };
  release(q);

  let after = allocate(64);
  assert!(!after.is_null());
  write_pattern(after, 64, 0x11);
  assert_pattern(after, 64, 0x11);
  release(after);
}

/// S2 — releasing and re-requesting the same small size typically reuses
/// the same region (the region is never fully drained in between).
#[test]
fn s2_tiny_release_then_reallocate() {
  let _g = guard();

  let a = allocate(50);
  assert!(!a.is_null());
  release(a);

  let b = allocate(50);
  assert!(!b.is_null());
  assert_eq!(a, b);
  release(b);
}

/// S3 — freeing the two outer blocks of a three-block run, then the
/// middle one, coalesces the whole run back into one block able to serve
/// a request that would not have fit any individual piece.
#[test]
fn s3_coalescing_after_out_of_order_release() {
  let _g = guard();

  let x = allocate(30);
  let y = allocate(30);
  let z = allocate(30);
  assert!(!x.is_null() && !y.is_null() && !z.is_null());

  release(x);
  release(z);
  release(y);

  let w = allocate(80);
  assert!(!w.is_null());
  // The merged run comfortably contains all three prior blocks' span;
  // `w` must land within that reclaimed address range.
  let lo = x.min(y).min(z) as usize;
  let hi = x.max(y).max(z) as usize + 64;
  let w_addr = w as usize;
  assert!(w_addr >= lo && w_addr < hi, "expected reuse of the coalesced run");

  release(w);
}

/// S4 — once every block in every TINY region has been released, no
/// TINY region remains mapped.
#[test]
fn s4_draining_a_class_reclaims_its_regions() {
  let _g = guard();

  let mut ptrs = Vec::with_capacity(150);
  for _ in 0..150 {
    let p = allocate(32);
    assert!(!p.is_null());
    ptrs.push(p);
  }

  for p in ptrs {
    release(p);
  }

  let dump = show_alloc_mem();
  assert!(!dump.contains("TINY :"), "dump still lists a TINY region:\n{}", dump);
}

/// S5 — a LARGE request gets its own region sized to exactly that
/// payload (rounded to eight bytes), and releasing it unmaps immediately.
#[test]
fn s5_large_allocation_is_isolated() {
  let _g = guard();

  let p = allocate(100_000);
  assert!(!p.is_null());
  write_pattern(p, 100_000, 0x42);
  assert_pattern(p, 100_000, 0x42);

  let dump = show_alloc_mem();
  assert!(dump.contains("LARGE :"));
  assert!(dump.contains("100000 bytes"));

  release(p);

  let dump_after = show_alloc_mem();
  assert!(!dump_after.contains("LARGE :"), "LARGE region should be gone:\n{}", dump_after);
}

/// S6 — ten threads hammering the allocator with a mix of allocate,
/// allocate+resize+release, and resize-from-null, complete without
/// corruption. Each thread keeps its own bookkeeping of live pointers and
/// verifies its own writes are never clobbered, which would only happen
/// if the shared pool's bookkeeping had raced.
#[test]
fn s6_concurrent_churn() {
  let _g = guard();

  const THREADS: usize = 10;
  const ITERATIONS: usize = 1000;

  let handles: Vec<_> = (0..THREADS)
    .map(|t| {
      std::thread::spawn(move || {
        let mut rng_state = 0x9E3779B9u32 ^ (t as u32).wrapping_mul(2654435761);
        let mut next_rand = move || {
          rng_state ^= rng_state << 13;
          rng_state ^= rng_state >> 17;
          rng_state ^= rng_state << 5;
          rng_state
        };

        for _ in 0..ITERATIONS {
          let op = next_rand() % 3;
          let size = (next_rand() % 256) as usize + 1;

          match op {
            0 => {
              let p = allocate(size);
              if !p.is_null() {
                write_pattern(p, size, 0xAA);
                assert_pattern(p, size, 0xAA);
                release(p);
              }
            }
            1 => {
              let p = allocate(size);
              if !p.is_null() {
                write_pattern(p, size, 0xBB);
                let new_size = (next_rand() % 256) as usize + 1;
                let q = resize(p, new_size);
                if !q.is_null() {
                  let common = size.min(new_size);
                  assert_pattern(q, common, 0xBB);
                  release(q);
                } else {
                  release(p);
                }
              }
            }
            _ => {
              let new_size = (next_rand() % 256) as usize + 1;
              let p = resize(std::ptr::null_mut(), new_size);
              if !p.is_null() {
                write_pattern(p, new_size, 0xDD);
                assert_pattern(p, new_size, 0xDD);
                release(p);
              }
            }
          }
        }
      })
    })
    .collect();

  for handle in handles {
    handle.join().expect("worker thread panicked");
  }
}
