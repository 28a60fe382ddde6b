//! Thread-safe wrapper around the engine.
//!
//! One non-recursive lock serialises every operation: at most one
//! allocation-domain operation is in progress at any instant, and calls from
//! any thread linearise at the point of lock acquisition. The engine itself
//! stays free of synchronisation; this wrapper is the only place a lock
//! exists, and no operation calls another public operation while holding it.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::seglist::SeglistAllocator;
use crate::source::{MemorySource, SystemSource};
use crate::stats::AllocStats;

/// A [`SeglistAllocator`] behind a single mutual-exclusion lock.
///
/// The four public operations and the administrative surface all take the
/// lock, so the wrapper is safe to share between threads (`&self` methods,
/// put it in an `Arc` or a `static`).
pub struct LockedAllocator<S: MemorySource = SystemSource> {
  inner: Mutex<SeglistAllocator<S>>,
}

impl LockedAllocator<SystemSource> {
  /// Creates a locked allocator over the real data segment and page
  /// mappings.
  pub fn new() -> Self {
    Self::with_engine(SeglistAllocator::new())
  }
}

impl<S: MemorySource> LockedAllocator<S> {
  /// Wraps an existing engine.
  pub fn with_engine(engine: SeglistAllocator<S>) -> Self {
    Self {
      inner: Mutex::new(engine),
    }
  }

  /// Acquires the global lock.
  ///
  /// A poisoned lock is recovered: the engine never panics mid-operation,
  /// so a panic while the lock was held can only have come from caller code
  /// between engine calls and the engine state is still consistent.
  fn engine(&self) -> MutexGuard<'_, SeglistAllocator<S>> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Locked [`SeglistAllocator::allocate`].
  ///
  /// # Safety
  ///
  /// Same contract as the engine operation; the locking removes the
  /// single-thread requirement.
  pub unsafe fn allocate(
    &self,
    size: usize,
  ) -> *mut u8 {
    unsafe { self.engine().allocate(size) }
  }

  /// Locked [`SeglistAllocator::deallocate`].
  ///
  /// # Safety
  ///
  /// Same contract as the engine operation; the locking removes the
  /// single-thread requirement.
  pub unsafe fn deallocate(
    &self,
    address: *mut u8,
  ) {
    unsafe { self.engine().deallocate(address) }
  }

  /// Locked [`SeglistAllocator::allocate_zeroed`].
  ///
  /// # Safety
  ///
  /// Same contract as the engine operation; the locking removes the
  /// single-thread requirement.
  pub unsafe fn allocate_zeroed(
    &self,
    count: usize,
    elem_size: usize,
  ) -> *mut u8 {
    unsafe { self.engine().allocate_zeroed(count, elem_size) }
  }

  /// Locked [`SeglistAllocator::reallocate`].
  ///
  /// # Safety
  ///
  /// Same contract as the engine operation; the locking removes the
  /// single-thread requirement.
  pub unsafe fn reallocate(
    &self,
    address: *mut u8,
    size: usize,
  ) -> *mut u8 {
    unsafe { self.engine().reallocate(address, size) }
  }

  /// Locked counter snapshot.
  pub fn stats(&self) -> AllocStats {
    self.engine().stats()
  }

  /// Locked statistics dump to standard output.
  pub fn print_stats(&self) {
    self.engine().print_stats();
  }

  /// Locked [`SeglistAllocator::reset`]. Addresses handed out before the
  /// reset are invalidated, so quiesce the other threads first.
  pub fn reset(&self) {
    self.engine().reset();
  }
}
