use super::{TestCase, TestResult};
use crate::{
    config::{PAGE_SIZE, USER_HEAP_BASE},
    mm::{MemoryControlBlock, VirtAddr, BLOCK_HEADER_SIZE},
};

pub const TESTS: &[TestCase] = &[
    TestCase::new("heap.chain_invariants", chain_invariants),
    TestCase::new("heap.round_trip_same_va", round_trip_same_va),
    TestCase::new("heap.exact_fit", exact_fit),
    TestCase::new("heap.coalesce_and_release", coalesce_and_release),
    TestCase::new("heap.page_spanning", page_spanning),
    TestCase::new("heap.vma_cache", vma_cache),
];

fn test_space() -> MemoryControlBlock {
    MemoryControlBlock::new_with_heap(VirtAddr::from(USER_HEAP_BASE))
}

fn chain_invariants() -> TestResult {
    let mut space = test_space();
    let a = space.allocate(40);
    let b = space.allocate(100);
    space.heap_vma().check_chains();
    if a.0 != USER_HEAP_BASE + BLOCK_HEADER_SIZE {
        return Err("first payload not right behind the first header");
    }
    if b.0 <= a.0 {
        return Err("allocations not address ordered");
    }
    space.free(a);
    space.heap_vma().check_chains();
    space.free(b);
    space.heap_vma().check_chains();
    Ok(())
}

fn round_trip_same_va() -> TestResult {
    let mut space = test_space();
    // keep the page alive so the round trip exercises block reuse, not a
    // full page release
    let _sentinel = space.allocate(8);
    let a = space.allocate(40);
    space.free(a);
    let b = space.allocate(40);
    if a != b {
        return Err("first fit did not reproduce the freed block");
    }
    space.heap_vma().check_chains();
    Ok(())
}

fn exact_fit() -> TestResult {
    let mut space = test_space();
    let _front = space.allocate(8);
    let a = space.allocate(40);
    // barrier keeps the hole from merging with the trailing free block
    let _barrier = space.allocate(8);
    let blocks_before = space.heap_vma().blocks_of_page(0).len();
    space.free(a);
    let b = space.allocate(40);
    if a != b {
        return Err("exact-size free block did not satisfy the request");
    }
    if space.heap_vma().blocks_of_page(0).len() != blocks_before {
        return Err("exact fit should not split");
    }
    space.heap_vma().check_chains();
    Ok(())
}

fn coalesce_and_release() -> TestResult {
    let mut space = test_space();
    let a = space.allocate(40);
    let b = space.allocate(40);
    space.free(a);
    space.heap_vma().check_chains();
    space.free(b);
    // both blocks merged back into one page-spanning free block, so the
    // frame goes back to the allocator and the region shrinks to nothing
    if space.heap_vma().mapped_page_count() != 0 {
        return Err("fully freed page was not released");
    }
    if space.heap_vma().end() != space.heap_vma().start() {
        return Err("region extent did not shrink");
    }
    let c = space.allocate(40);
    if c != a {
        return Err("fresh page after release should restart at the base");
    }
    if space.heap_vma().mapped_page_count() != 1 {
        return Err("allocation after release should map a fresh frame");
    }
    Ok(())
}

fn page_spanning() -> TestResult {
    let mut space = test_space();
    // fills one page exactly: payload + header == PAGE_SIZE
    let a = space.allocate(PAGE_SIZE - BLOCK_HEADER_SIZE);
    let b = space.allocate(40);
    space.heap_vma().check_chains();
    if space.heap_vma().mapped_page_count() != 2 {
        return Err("second allocation should map a second page");
    }
    if b.0 != USER_HEAP_BASE + PAGE_SIZE + BLOCK_HEADER_SIZE {
        return Err("second chain should continue the offset space");
    }
    space.free(a);
    if space.heap_vma().mapped_page_count() != 1 {
        return Err("inner page was not released");
    }
    space.free(b);
    if space.heap_vma().mapped_page_count() != 0 {
        return Err("trailing page was not released");
    }
    space.heap_vma().check_chains();
    Ok(())
}

fn vma_cache() -> TestResult {
    let mut space = test_space();
    if space.vma_cache_index().is_some() {
        return Err("cache should start cold");
    }
    space.allocate(16);
    if space.vma_cache_index().is_none() {
        return Err("lookup should warm the cache");
    }
    Ok(())
}
