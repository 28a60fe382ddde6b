//! The same allocator driven by the real OS primitives.
//!
//! The process break is shared global state, so everything lives in a single
//! test function: one engine, one sequence, no parallel break movement.
//! (Each integration test file is its own process, so the other suites
//! cannot interfere either.)

use segalloc::SeglistAllocator;

#[test]
fn system_backed_end_to_end() {
  let mut allocator = SeglistAllocator::new();

  unsafe {
    // Small allocations come from the data segment and recycle.
    let first = allocator.allocate(100);
    assert!(!first.is_null());
    assert_eq!(first as usize % 16, 0);

    std::ptr::write_bytes(first, 0xA5, 100);
    for i in 0..100 {
      assert_eq!(*first.add(i), 0xA5);
    }

    allocator.deallocate(first);
    let again = allocator.allocate(100);
    assert_eq!(again, first, "freed heap block not reused");

    // Zeroed allocation after the 0xA5 fill: the recycled bytes must not
    // shine through.
    allocator.deallocate(again);
    let zeroed = allocator.allocate_zeroed(10, 10);
    assert!(!zeroed.is_null());
    for i in 0..100 {
      assert_eq!(*zeroed.add(i), 0);
    }

    // Resize round trip.
    let text = b"Hello, World!";
    std::ptr::copy_nonoverlapping(text.as_ptr(), zeroed, text.len());
    let grown = allocator.reallocate(zeroed, 4000);
    assert!(!grown.is_null());
    for (i, &byte) in text.iter().enumerate() {
      assert_eq!(*grown.add(i), byte);
    }
    allocator.deallocate(grown);

    // 256 KiB crosses the mapped-path threshold: the block comes from a
    // private mapping, is writable end to end, and vanishes on release
    // rather than entering a free list.
    let usage_before = allocator.stats().current_usage;
    let large = allocator.allocate(256 * 1024);
    assert!(!large.is_null());
    assert_eq!(large as usize % 16, 0);

    std::ptr::write_bytes(large, 0xAB, 256 * 1024);
    assert_eq!(*large, 0xAB);
    assert_eq!(*large.add(256 * 1024 - 1), 0xAB);

    allocator.deallocate(large);
    let stats = allocator.stats();
    assert_eq!(stats.current_usage, usage_before);

    // A mapped block is gone for good: a same-sized follow-up may land on
    // a fresh mapping, but the counters must stay balanced either way.
    assert_eq!(stats.num_allocations, stats.num_frees);
  }
}
