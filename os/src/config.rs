pub use crate::board::*;

pub const KERNEL_HEAP_SIZE: usize = 0x200000; // 2MB

pub const PAGE_SIZE: usize = 0x1000; // 4KB
pub const PAGE_SIZE_BITS: usize = 12;

/// Top of every user stack; the initial stack page sits right below it.
pub const USER_STACK_TOP: usize = 0x7fff_f000;
/// How far a user stack may grow downward through store-fault handling.
pub const USER_STACK_LIMIT: usize = 16 * PAGE_SIZE;
/// Base of the heap region managed by the sub-page allocator.
pub const USER_HEAP_BASE: usize = 0x4000_0000;

/// The program started as the single bootstrap process.
pub const INIT_APP: &str = "heap_demo";
