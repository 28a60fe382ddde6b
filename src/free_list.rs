//! Segregated free lists.
//!
//! Free heap blocks are kept in ten doubly linked lists, one per size class.
//! Classification is by *total* block size (header included) with inclusive
//! upper bounds, so the boundary value belongs to the lower class:
//!
//! ```text
//!   class:       0     1     2     3     4      5      6      7      8     9
//!   bound:     ≤32   ≤64  ≤128  ≤256  ≤512  ≤1024  ≤2048  ≤4096  ≤8192     ∞
//! ```
//!
//! Insertion is at the head (amortised constant time), removal is constant
//! time through the `prev`/`next` links, and a search walks one class head to
//! tail before moving to the next class up. Blocks within a class are in no
//! particular order.

use std::ptr;

use crate::block::Block;

/// Number of size classes the free blocks are binned into.
pub const NUM_SIZE_CLASSES: usize = 10;

/// Maps a total block size to its size class index.
pub fn size_class(size: usize) -> usize {
  match size {
    0..=32 => 0,
    33..=64 => 1,
    65..=128 => 2,
    129..=256 => 3,
    257..=512 => 4,
    513..=1024 => 5,
    1025..=2048 => 6,
    2049..=4096 => 7,
    4097..=8192 => 8,
    _ => 9,
  }
}

/// The array of free-list heads.
pub struct FreeLists {
  heads: [*mut Block; NUM_SIZE_CLASSES],
}

impl FreeLists {
  pub const fn new() -> Self {
    Self {
      heads: [ptr::null_mut(); NUM_SIZE_CLASSES],
    }
  }

  /// Inserts `block` at the head of the list for its size class and marks it
  /// free.
  ///
  /// # Safety
  ///
  /// `block` must point at a live non-mapped header that is currently on no
  /// free list, and must stay valid for as long as it is linked here.
  pub unsafe fn push(
    &mut self,
    block: *mut Block,
  ) {
    unsafe {
      let class = size_class((*block).size);

      (*block).next = self.heads[class];
      (*block).prev = ptr::null_mut();

      if !self.heads[class].is_null() {
        (*self.heads[class]).prev = block;
      }

      self.heads[class] = block;
      (*block).is_free = true;
    }
  }

  /// Unlinks `block` from the list of its size class.
  ///
  /// The class is derived from the block's current `size`, so the size field
  /// must not have changed since the block was pushed.
  ///
  /// # Safety
  ///
  /// `block` must point at a live header that is linked in this list array.
  pub unsafe fn unlink(
    &mut self,
    block: *mut Block,
  ) {
    unsafe {
      let class = size_class((*block).size);

      if (*block).prev.is_null() {
        self.heads[class] = (*block).next;
      } else {
        (*(*block).prev).next = (*block).next;
      }

      if !(*block).next.is_null() {
        (*(*block).next).prev = (*block).prev;
      }

      (*block).next = ptr::null_mut();
      (*block).prev = ptr::null_mut();
    }
  }

  /// First-fit search: walks the class of `size` and every class above it,
  /// returning the first free block large enough, or null.
  ///
  /// # Safety
  ///
  /// Every block linked in this list array must still be alive.
  pub unsafe fn find(
    &self,
    size: usize,
  ) -> *mut Block {
    unsafe {
      for class in size_class(size)..NUM_SIZE_CLASSES {
        let mut current = self.heads[class];

        while !current.is_null() {
          if (*current).is_free && (*current).size >= size {
            return current;
          }
          current = (*current).next;
        }
      }

      ptr::null_mut()
    }
  }

  /// Drops every list head. The blocks themselves are not touched.
  pub fn clear(&mut self) {
    self.heads = [ptr::null_mut(); NUM_SIZE_CLASSES];
  }

  /// Number of blocks currently linked in the given class.
  ///
  /// # Safety
  ///
  /// Every block linked in this list array must still be alive.
  pub unsafe fn len_of(
    &self,
    class: usize,
  ) -> usize {
    unsafe {
      let mut count = 0;
      let mut current = self.heads[class];

      while !current.is_null() {
        count += 1;
        current = (*current).next;
      }

      count
    }
  }

  /// Whether `block` is linked anywhere in this list array.
  ///
  /// # Safety
  ///
  /// Every block linked in this list array must still be alive.
  pub unsafe fn contains(
    &self,
    block: *mut Block,
  ) -> bool {
    unsafe {
      for class in 0..NUM_SIZE_CLASSES {
        let mut current = self.heads[class];

        while !current.is_null() {
          if current == block {
            return true;
          }
          current = (*current).next;
        }
      }

      false
    }
  }
}
