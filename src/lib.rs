//! # segalloc - A Segregated Free-List Memory Allocator
//!
//! This crate provides a general-purpose dynamic memory allocator that
//! replaces the platform allocation primitives for process-local code. It
//! obtains memory directly from the operating system (`sbrk` for the
//! contiguous heap, `mmap` for large blocks) and serves the four classic
//! operations: allocate, release, zero-initialised allocate and resize.
//!
//! ## Overview
//!
//! ```text
//!   Request path:
//!
//!   caller ──► [LockedAllocator]  (optional: one global lock)
//!                    │
//!                    ▼
//!              SeglistAllocator   (the engine)
//!                    │
//!         ┌──────────┴───────────┐
//!         ▼                      ▼
//!   rounded size < 128 KiB  rounded size ≥ 128 KiB
//!   segregated free lists,  one anonymous page
//!   heap growth, splitting  mapping per block
//!         │                      │
//!         ▼                      ▼
//!       sbrk                   mmap
//! ```
//!
//! Every block starts with a 32-byte header; the address handed to the
//! caller points just past it and is always 16-aligned:
//!
//! ```text
//!   ┌───────────────────────┬────────────────────────────────┐
//!   │    Block Header       │         Payload                │
//!   │  ┌─────────────────┐  │                                │
//!   │  │ size            │  │  ┌──────────────────────────┐  │
//!   │  │ next, prev      │  │  │   size - 32 bytes usable │  │
//!   │  │ is_free         │  │  │                          │  │
//!   │  │ is_mapped       │  │  └──────────────────────────┘  │
//!   │  └─────────────────┘  │                                │
//!   └───────────────────────┴────────────────────────────────┘
//!                           ▲
//!                           └── Pointer returned to the caller
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   segalloc
//!   ├── align      - Alignment macros and the 16-byte constant
//!   ├── block      - Block header and pointer coercions
//!   ├── free_list  - Ten size-classed doubly linked free lists
//!   ├── source     - OS seam: SystemSource (sbrk/mmap), ArenaSource (tests)
//!   ├── seglist    - SeglistAllocator, the allocation engine
//!   ├── stats      - AllocStats counters and their textual dump
//!   └── locked     - LockedAllocator, the thread-safe wrapper
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use segalloc::SeglistAllocator;
//!
//! let mut allocator = SeglistAllocator::new();
//!
//! unsafe {
//!     let ptr = allocator.allocate(100);
//!     assert!(!ptr.is_null());
//!
//!     ptr.write(42);
//!     assert_eq!(ptr.read(), 42);
//!
//!     allocator.deallocate(ptr);
//! }
//! ```
//!
//! For multi-threaded use, wrap the engine:
//!
//! ```rust,no_run
//! use segalloc::LockedAllocator;
//!
//! let allocator = LockedAllocator::new();
//!
//! unsafe {
//!     let ptr = allocator.allocate(100);
//!     allocator.deallocate(ptr);
//! }
//! ```
//!
//! ## Failure Model
//!
//! Every failure surfaces as a null address: zero-size requests,
//! multiplication overflow in zeroed allocation, and OS refusal to grow the
//! heap or map pages. The allocator never aborts the process and never
//! prints; the `tracing` events it emits are inert unless a subscriber is
//! installed. On a failed resize the original block stays valid and
//! untouched.
//!
//! ## Safety
//!
//! This crate manages raw memory, so the four operations are `unsafe`.
//! Callers must ensure:
//! - Addresses passed to `deallocate`/`reallocate` came from the same
//!   allocator and have not been released already
//! - Addresses are not used after release (or after a reset)
//! - The unsynchronised engine is not used from several threads at once
//!
//! Releasing an address the allocator never produced, releasing twice, or
//! releasing a shifted address is undefined behaviour with no diagnostic,
//! matching the standard allocator contract.

pub mod align;
mod block;
mod free_list;
mod locked;
mod seglist;
mod source;
mod stats;

pub use align::ALIGNMENT;
pub use locked::LockedAllocator;
pub use seglist::{BRK_INCREMENT, MIN_BLOCK_SIZE, MMAP_THRESHOLD, SeglistAllocator};
pub use source::{ArenaSource, MemorySource, SystemSource};
pub use stats::AllocStats;
