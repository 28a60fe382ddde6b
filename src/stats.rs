//! Allocation statistics.

use std::fmt;

/// Counters updated on every engine operation.
///
/// All byte counters count *block* bytes, header included, not the sizes
/// callers asked for. Everything is cumulative except `current_usage`, which
/// moves up on allocation and down on release, so
/// `current_usage == total_allocated - total_freed` holds at all times.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AllocStats {
  /// Block bytes ever handed out.
  pub total_allocated: usize,
  /// Block bytes ever returned.
  pub total_freed: usize,
  /// Block bytes currently owned by callers.
  pub current_usage: usize,
  /// Successful allocations.
  pub num_allocations: usize,
  /// Releases of non-null addresses.
  pub num_frees: usize,
  /// Block splits performed.
  pub num_splits: usize,
  /// Forward merges performed.
  pub num_coalesces: usize,
}

impl AllocStats {
  pub(crate) fn record_alloc(
    &mut self,
    block_size: usize,
  ) {
    self.total_allocated += block_size;
    self.current_usage += block_size;
    self.num_allocations += 1;
  }

  pub(crate) fn record_free(
    &mut self,
    block_size: usize,
  ) {
    self.total_freed += block_size;
    self.current_usage -= block_size;
    self.num_frees += 1;
  }
}

impl fmt::Display for AllocStats {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "Memory Allocator Statistics:")?;
    writeln!(f, "  Total allocated: {} bytes", self.total_allocated)?;
    writeln!(f, "  Total freed: {} bytes", self.total_freed)?;
    writeln!(f, "  Current usage: {} bytes", self.current_usage)?;
    writeln!(f, "  Number of allocations: {}", self.num_allocations)?;
    writeln!(f, "  Number of frees: {}", self.num_frees)?;
    writeln!(f, "  Number of splits: {}", self.num_splits)?;
    write!(f, "  Number of coalesces: {}", self.num_coalesces)
  }
}
