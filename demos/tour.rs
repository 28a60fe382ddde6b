use std::ptr;

use segalloc::{LockedAllocator, SeglistAllocator};

/// Prints the current program break using `sbrk(0)`.
/// The break moves as the allocator grows the data segment, which makes the
/// heap-path allocations below visible from the outside.
unsafe fn print_program_break(label: &str) {
  println!(
    "[{}] PID = {}, program break (sbrk(0)) = {:?}",
    label,
    std::process::id(),
    unsafe { libc::sbrk(0) },
  );
}

fn main() {
  // Engine trace/debug events are inert unless a subscriber is installed;
  // run with RUST_LOG=segalloc=trace to watch the allocator work.
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let mut allocator = SeglistAllocator::new();

  unsafe {
    print_program_break("start");

    // --------------------------------------------------------------------
    // 1) Basic usage: allocate, write, read back, release.
    // --------------------------------------------------------------------
    println!("\n[1] Basic usage");
    let message = allocator.allocate(50);
    let text = b"Hello from the segregated-list allocator!";
    ptr::copy_nonoverlapping(text.as_ptr(), message, text.len());
    println!(
      "[1] Message: {}",
      std::str::from_utf8(std::slice::from_raw_parts(message, text.len())).unwrap()
    );
    allocator.deallocate(message);

    // --------------------------------------------------------------------
    // 2) Zero-initialised allocation: an array of ten u32 values.
    // --------------------------------------------------------------------
    println!("\n[2] Zeroed allocation");
    let numbers = allocator.allocate_zeroed(10, size_of::<u32>()) as *mut u32;
    print!("[2] Initial values (should be 0):");
    for i in 0..10 {
      print!(" {}", numbers.add(i).read());
    }
    println!();

    for i in 0..10 {
      numbers.add(i).write((i * i) as u32);
    }
    print!("[2] After assignment:");
    for i in 0..10 {
      print!(" {}", numbers.add(i).read());
    }
    println!();
    allocator.deallocate(numbers as *mut u8);

    // --------------------------------------------------------------------
    // 3) Resizing: grow a buffer, then shrink it. Shrinking stays in
    //    place; growing moves the contents to a fresh block.
    // --------------------------------------------------------------------
    println!("\n[3] Resize");
    let buffer = allocator.allocate(20);
    ptr::copy_nonoverlapping(b"Short string".as_ptr(), buffer, 12);

    let buffer = allocator.reallocate(buffer, 100);
    println!("[3] Grown to 100 bytes, contents preserved");

    let buffer = allocator.reallocate(buffer, 30);
    println!("[3] Shrunk to 30 bytes, same address");
    allocator.deallocate(buffer);

    // --------------------------------------------------------------------
    // 4) Large allocation: 1 MiB crosses the 128 KiB threshold and comes
    //    from a private anonymous mapping instead of the heap. Note that
    //    the program break does not move for this one.
    // --------------------------------------------------------------------
    println!("\n[4] Large allocation (mapped)");
    print_program_break("before mapped alloc");
    let large = allocator.allocate(1024 * 1024);
    ptr::write_bytes(large, b'X', 1024 * 1024);
    println!(
      "[4] Filled 1 MiB with 'X': first = '{}', last = '{}'",
      *large as char,
      *large.add(1024 * 1024 - 1) as char
    );
    print_program_break("after mapped alloc");
    allocator.deallocate(large);

    // --------------------------------------------------------------------
    // 5) Mixed sizes across every size class.
    // --------------------------------------------------------------------
    println!("\n[5] Mixed allocations");
    let sizes = [16, 32, 64, 128, 256, 512, 1024, 2048, 4096, 8192];
    let blocks: Vec<*mut u8> = sizes
      .iter()
      .map(|&size| {
        println!("[5] Allocated {size} bytes");
        allocator.allocate(size)
      })
      .collect();

    println!();
    allocator.print_stats();
    println!();

    for &block in blocks.iter().rev() {
      allocator.deallocate(block);
    }
    println!("[5] All released (reverse order coalesces back together)");
  }

  // ----------------------------------------------------------------------
  // 6) The thread-safe wrapper: same operations, shareable between
  //    threads, serialised through one lock.
  // ----------------------------------------------------------------------
  println!("\n[6] Locked wrapper");
  let locked = LockedAllocator::new();
  unsafe {
    let a = locked.allocate(100);
    let b = locked.allocate_zeroed(10, 20);
    let a = locked.reallocate(a, 200);
    locked.deallocate(a);
    locked.deallocate(b);
  }
  println!("[6] Allocated, resized and released through the lock");

  println!("\n=== Final statistics (engine instance) ===");
  allocator.print_stats();
}
