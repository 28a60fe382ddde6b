//! # Segregated-list allocator
//!
//! The allocation engine: a general-purpose heap built from segregated free
//! lists, block splitting and forward coalescing, with a page-mapping fast
//! path for large requests.
//!
//! ## Overview
//!
//! Memory is carved into blocks, each led by a fixed 32-byte header. Small
//! and medium blocks live in one contiguous heap region obtained by growing
//! the process data segment; free ones are binned into ten size-classed
//! lists. Large blocks bypass the heap entirely and get a private anonymous
//! mapping each.
//!
//! ### Memory Layout Diagram
//!
//! ```text
//!                 HEAP REGION (contiguous, grows upward →)
//!
//!   heap_start                                              heap_end
//!       │                                                       │
//!       ▼                                                       ▼
//!   ┌───────────┬──────────┬───────────────┬───────────────────┐
//!   │ Block A   │ Block B  │    Block C    │      Block D      │
//!   │ (in use)  │ (free)   │   (in use)    │      (free)       │
//!   └───────────┴──────────┴───────────────┴───────────────────┘
//!                    │                               │
//!          ┌─────────┘                               │
//!          ▼                                         ▼
//!   free_lists[class(B.size)] ──► B          free_lists[class(D.size)] ──► D
//!
//!   Blocks are adjacent with no gaps: a block's successor in memory
//!   begins exactly at its end, which is what makes forward coalescing
//!   a constant-time address computation.
//!
//!                 MAPPED BLOCKS (one mapping each)
//!
//!   ┌──────────────────────────┐      ┌──────────────────────────┐
//!   │ Block M1 (is_mapped)     │      │ Block M2 (is_mapped)     │
//!   └──────────────────────────┘      └──────────────────────────┘
//!   Never on a free list, never coalesced, unmapped on release.
//! ```
//!
//! ### Allocation Path (Step by Step)
//!
//! ```text
//!   STEP 1: Round the request
//!   ┌─────────────────────────────────────────────────────────┐
//!   │  total_size = align!(requested + HEADER_SIZE)           │
//!   └─────────────────────────────────────────────────────────┘
//!
//!   STEP 2: Pick the path
//!   ┌─────────────────────────────────────────────────────────┐
//!   │  total_size >= 128 KiB  ──►  map one block, done        │
//!   │  otherwise              ──►  heap path below            │
//!   └─────────────────────────────────────────────────────────┘
//!
//!   STEP 3: First-fit search, classes ascending
//!   ┌─────────────────────────────────────────────────────────┐
//!   │  for class in class(total_size)..10:                    │
//!   │      first block with size >= total_size wins           │
//!   └─────────────────────────────────────────────────────────┘
//!
//!   STEP 4: No fit? Extend the heap
//!   ┌─────────────────────────────────────────────────────────┐
//!   │  grow by max(64 KiB, align!(total_size)), build one     │
//!   │  free block over the whole new region                   │
//!   └─────────────────────────────────────────────────────────┘
//!
//!   STEP 5: Split off the excess, mark in use, count, return  │
//! ```
//!
//! ## Thread Safety
//!
//! The engine is **not** thread-safe: no internal synchronisation, no
//! suspension points apart from the OS calls themselves. Either keep all
//! calls on one thread or wrap the engine in
//! [`LockedAllocator`](crate::LockedAllocator).

use std::ptr::{self, NonNull};

use tracing::{debug, trace};

use crate::align;
use crate::align::ALIGNMENT;
use crate::block::{Block, HEADER_SIZE};
use crate::free_list::FreeLists;
use crate::source::{MemorySource, SystemSource};
use crate::stats::AllocStats;

/// Smallest amount of payload-bearing space a split remainder may have;
/// splitting stops below it so free blocks stay usable.
pub const MIN_BLOCK_SIZE: usize = 32;

/// Rounded block sizes at or above this take the mapped path.
pub const MMAP_THRESHOLD: usize = 128 * 1024;

/// Minimum amount the contiguous heap grows by in one extension.
pub const BRK_INCREMENT: usize = 64 * 1024;

/// The single-heap allocation engine.
///
/// One value owns one heap: its free lists, its heap bounds and its
/// statistics. The engine backed by [`SystemSource`] manages the process
/// data segment; tests usually run it over an
/// [`ArenaSource`](crate::ArenaSource) instead, which scopes everything to
/// the instance.
pub struct SeglistAllocator<S: MemorySource = SystemSource> {
  source: S,

  /// Free heap blocks, binned by size class.
  free_lists: FreeLists,

  /// Lower bound of the heap region, captured on the first extension.
  heap_start: *mut u8,

  /// Upper bound of the heap region, advances monotonically.
  heap_end: *mut u8,

  stats: AllocStats,
}

// The raw pointers all refer to memory owned by this allocator (heap region
// and mapped blocks); handing the whole value to another thread hands over
// that ownership with it.
unsafe impl<S: MemorySource + Send> Send for SeglistAllocator<S> {}

impl SeglistAllocator<SystemSource> {
  /// Creates an engine backed by the real data segment and page mappings.
  pub fn new() -> Self {
    Self::with_source(SystemSource)
  }
}

impl<S: MemorySource> SeglistAllocator<S> {
  /// Creates an engine on top of an arbitrary memory source.
  pub fn with_source(source: S) -> Self {
    Self {
      source,
      free_lists: FreeLists::new(),
      heap_start: ptr::null_mut(),
      heap_end: ptr::null_mut(),
      stats: AllocStats::default(),
    }
  }

  /// Allocates a block with at least `size` payload bytes and returns the
  /// 16-aligned payload address, or null on failure.
  ///
  /// A zero `size` fails by returning null. Counters are advanced only once
  /// the allocation has succeeded.
  ///
  /// # Safety
  ///
  /// The allocator's internal state must be valid and no other thread may be
  /// operating on it concurrently.
  pub unsafe fn allocate(
    &mut self,
    size: usize,
  ) -> *mut u8 {
    if size == 0 {
      return ptr::null_mut();
    }
    // Requests this close to the address-space limit cannot be rounded
    // without wrapping; fail them like any other impossible request.
    if size > usize::MAX - HEADER_SIZE - ALIGNMENT {
      return ptr::null_mut();
    }

    let total_size = align!(size + HEADER_SIZE);

    if total_size >= MMAP_THRESHOLD {
      return unsafe { self.allocate_mapped(total_size) };
    }

    unsafe {
      let mut block = self.free_lists.find(total_size);

      if block.is_null() {
        block = self.expand_heap(total_size);
        if block.is_null() {
          return ptr::null_mut();
        }
      } else {
        // Only blocks that actually came off a list get unlinked; a fresh
        // extension block was never inserted.
        self.free_lists.unlink(block);
      }

      self.split_block(block, total_size);
      (*block).is_free = false;

      self.stats.record_alloc((*block).size);
      trace!(requested = size, block_size = (*block).size, "heap allocation");

      Block::payload(block)
    }
  }

  /// Releases a block previously returned by this allocator.
  ///
  /// Mapped blocks are returned to the OS whole. Heap blocks are merged
  /// with their free forward neighbours and re-inserted into the free list
  /// of their (possibly grown) size class. A null `address` is a no-op.
  ///
  /// # Safety
  ///
  /// `address` must be null or a payload address previously returned by
  /// this allocator and not released since. No other thread may be
  /// operating on the allocator concurrently.
  pub unsafe fn deallocate(
    &mut self,
    address: *mut u8,
  ) {
    if address.is_null() {
      return;
    }

    unsafe {
      let block = Block::from_payload(address);

      if (*block).is_mapped {
        let size = (*block).size;
        self.stats.record_free(size);
        trace!(block_size = size, "unmapping block");

        let Some(addr) = NonNull::new(block as *mut u8) else {
          return;
        };
        self.source.unmap(addr, size);
        return;
      }

      self.stats.record_free((*block).size);

      (*block).is_free = true;
      self.coalesce(block);
      self.free_lists.push(block);
      trace!(block_size = (*block).size, "released block");
    }
  }

  /// Allocates `count * elem_size` payload bytes and zeroes them.
  ///
  /// Returns null when either factor is zero, when the product overflows,
  /// or when the underlying allocation fails.
  ///
  /// # Safety
  ///
  /// Same as [`SeglistAllocator::allocate`].
  pub unsafe fn allocate_zeroed(
    &mut self,
    count: usize,
    elem_size: usize,
  ) -> *mut u8 {
    if count == 0 || elem_size == 0 {
      return ptr::null_mut();
    }
    let Some(total) = count.checked_mul(elem_size) else {
      return ptr::null_mut();
    };

    unsafe {
      let address = self.allocate(total);
      if !address.is_null() {
        ptr::write_bytes(address, 0, total);
      }
      address
    }
  }

  /// Resizes the allocation at `address` to at least `size` payload bytes.
  ///
  /// A null `address` behaves as an allocation, a zero `size` as a release
  /// (returning null). When the block's payload capacity already covers the
  /// request the same address comes back untouched; there is no
  /// shrink-in-place. Otherwise the contents move to a fresh block and the
  /// old one is released.
  ///
  /// The copy length is the old block's payload *capacity*, which may run
  /// past the bytes the caller logically wrote; it never reads outside the
  /// old block, and the new block is large enough to take it.
  ///
  /// On allocation failure the result is null and the old block stays valid
  /// and untouched.
  ///
  /// # Safety
  ///
  /// Same as [`SeglistAllocator::deallocate`] for `address`; the caller
  /// must stop using `address` when a different address comes back.
  pub unsafe fn reallocate(
    &mut self,
    address: *mut u8,
    size: usize,
  ) -> *mut u8 {
    if address.is_null() {
      return unsafe { self.allocate(size) };
    }
    if size == 0 {
      unsafe { self.deallocate(address) };
      return ptr::null_mut();
    }

    unsafe {
      let block = Block::from_payload(address);
      let old_payload_size = (*block).size - HEADER_SIZE;

      if old_payload_size >= size {
        return address;
      }

      let new_address = self.allocate(size);
      if new_address.is_null() {
        return ptr::null_mut();
      }

      ptr::copy_nonoverlapping(address, new_address, old_payload_size);
      self.deallocate(address);

      new_address
    }
  }

  /// Returns a copy of the current counters.
  pub fn stats(&self) -> AllocStats {
    self.stats
  }

  /// Writes the counters to standard output as human-readable lines.
  pub fn print_stats(&self) {
    println!("{}", self.stats);
  }

  /// Zeroes every counter and empties every free list.
  ///
  /// Heap memory is *not* returned to the OS (the contiguous region cannot
  /// be partially given back); the allocator simply starts over on top of
  /// it. Every address handed out before the reset is invalidated and must
  /// not be used or released afterwards.
  pub fn reset(&mut self) {
    self.stats = AllocStats::default();
    self.free_lists.clear();
    debug!("allocator reset");
  }

  /// Mapped path: one private anonymous mapping per block, exactly the
  /// rounded size, never entering a free list.
  unsafe fn allocate_mapped(
    &mut self,
    total_size: usize,
  ) -> *mut u8 {
    let Some(addr) = self.source.map(total_size) else {
      return ptr::null_mut();
    };

    let block = addr.as_ptr() as *mut Block;
    unsafe {
      ptr::write(block, Block::new(total_size, false, true));

      self.stats.record_alloc(total_size);
      debug!(block_size = total_size, "mapped allocation");

      Block::payload(block)
    }
  }

  /// Grows the heap and builds a single free block over the new region.
  ///
  /// The extension is at least [`BRK_INCREMENT`] and always rounded to the
  /// alignment, so `heap_end` stays 16-aligned. Returns null when the OS
  /// refuses; nothing is recorded in that case.
  unsafe fn expand_heap(
    &mut self,
    total_size: usize,
  ) -> *mut Block {
    let grow_by = if total_size < BRK_INCREMENT {
      BRK_INCREMENT
    } else {
      align!(total_size)
    };

    let Some(region) = self.source.grow(grow_by) else {
      return ptr::null_mut();
    };
    let region = region.as_ptr();

    if self.heap_start.is_null() {
      self.heap_start = region;
    }
    let region_end = unsafe { region.add(grow_by) };
    if region_end > self.heap_end {
      self.heap_end = region_end;
    }

    debug!(bytes = grow_by, "extended heap");

    let block = region as *mut Block;
    unsafe {
      ptr::write(block, Block::new(grow_by, true, false));
    }
    block
  }

  /// Splits `block` when it can spare a usable remainder beyond
  /// `total_size`: the leading `total_size` bytes stay with `block`, the
  /// rest becomes a new free block in its own size class.
  unsafe fn split_block(
    &mut self,
    block: *mut Block,
    total_size: usize,
  ) {
    unsafe {
      if (*block).size < total_size + HEADER_SIZE + MIN_BLOCK_SIZE {
        return;
      }

      let remainder = (block as *mut u8).add(total_size) as *mut Block;
      ptr::write(remainder, Block::new((*block).size - total_size, true, false));
      (*block).size = total_size;

      self.free_lists.push(remainder);
      self.stats.num_splits += 1;
    }
  }

  /// Forward coalescing: absorbs the physically following block for as long
  /// as it lies within the heap region, is free and is not mapped.
  ///
  /// The freed block is never merged with its *backward* neighbour; the
  /// header stores no boundary tag that would make the predecessor
  /// findable, an accepted fragmentation trade-off.
  unsafe fn coalesce(
    &mut self,
    block: *mut Block,
  ) {
    unsafe {
      loop {
        let successor = Block::successor(block);
        let successor_addr = successor as *mut u8;

        if successor_addr < self.heap_start || successor_addr >= self.heap_end {
          return;
        }
        // The whole header has to fit before the boundary to be readable.
        if successor_addr.add(HEADER_SIZE) > self.heap_end {
          return;
        }
        if !(*successor).is_free || (*successor).is_mapped {
          return;
        }

        self.free_lists.unlink(successor);
        (*block).size += (*successor).size;
        self.stats.num_coalesces += 1;
      }
    }
  }
}
