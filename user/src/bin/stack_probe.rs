#![no_std]
#![no_main]

#[macro_use]
extern crate user_lib;

use user_lib::backtrace;

/// Recurses deep enough to push the stack well past its initial page, so
/// every new page arrives through the store-fault growth path, then prints
/// a backtrace from the bottom.
#[inline(never)]
fn probe(depth: usize) -> u64 {
    let mut pad = [0u64; 64];
    pad[0] = depth as u64;
    pad[63] = depth as u64;
    if depth == 0 {
        backtrace(8);
        pad[0]
    } else {
        pad[63] + probe(depth - 1)
    }
}

#[no_mangle]
pub extern "C" fn main() -> i32 {
    let sum = probe(48);
    println!("stack_probe: descended with checksum {}", sum);
    0
}
