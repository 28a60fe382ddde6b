//! Churn benchmarks: the allocator against the system one.
//!
//! The workload keeps a ring of 1000 slots, each iteration releasing the
//! slot's previous block and allocating a fresh one of random size up to
//! 4 KiB, which exercises free-list reuse, splitting and coalescing rather
//! than pure heap growth.

use std::alloc::{Layout, alloc, dealloc};
use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use segalloc::SeglistAllocator;

const SLOTS: usize = 1000;
const MAX_ALLOC_SIZE: usize = 4096;

fn churn_segalloc(c: &mut Criterion) {
  let mut allocator = SeglistAllocator::new();
  let mut rng = StdRng::seed_from_u64(1);
  let mut slots: Vec<*mut u8> = vec![std::ptr::null_mut(); SLOTS];
  let mut index = 0usize;

  c.bench_function("churn/segalloc", |b| {
    b.iter(|| {
      index = (index + 1) % SLOTS;
      let size = rng.gen_range(1..=MAX_ALLOC_SIZE);

      unsafe {
        if !slots[index].is_null() {
          allocator.deallocate(slots[index]);
        }
        let ptr = allocator.allocate(size);
        if !ptr.is_null() {
          std::ptr::write_bytes(ptr, 0, size);
        }
        slots[index] = black_box(ptr);
      }
    });
  });

  unsafe {
    for &ptr in &slots {
      allocator.deallocate(ptr);
    }
  }
}

fn churn_system(c: &mut Criterion) {
  let mut rng = StdRng::seed_from_u64(1);
  let mut slots: Vec<(*mut u8, usize)> = vec![(std::ptr::null_mut(), 0); SLOTS];
  let mut index = 0usize;

  c.bench_function("churn/system", |b| {
    b.iter(|| {
      index = (index + 1) % SLOTS;
      let size = rng.gen_range(1..=MAX_ALLOC_SIZE);
      let layout = Layout::from_size_align(size, 16).unwrap();

      unsafe {
        let (old_ptr, old_size) = slots[index];
        if !old_ptr.is_null() {
          dealloc(old_ptr, Layout::from_size_align(old_size, 16).unwrap());
        }
        let ptr = alloc(layout);
        if !ptr.is_null() {
          std::ptr::write_bytes(ptr, 0, size);
        }
        slots[index] = (black_box(ptr), size);
      }
    });
  });

  unsafe {
    for &(ptr, size) in &slots {
      if !ptr.is_null() {
        dealloc(ptr, Layout::from_size_align(size, 16).unwrap());
      }
    }
  }
}

fn zeroed_allocation(c: &mut Criterion) {
  let mut allocator = SeglistAllocator::new();
  let mut rng = StdRng::seed_from_u64(2);

  c.bench_function("zeroed/segalloc", |b| {
    b.iter(|| {
      let count = rng.gen_range(1..=100);
      let elem_size = rng.gen_range(1..=100);

      unsafe {
        let ptr = allocator.allocate_zeroed(count, elem_size);
        allocator.deallocate(black_box(ptr));
      }
    });
  });
}

criterion_group!(benches, churn_segalloc, churn_system, zeroed_allocation);
criterion_main!(benches);
