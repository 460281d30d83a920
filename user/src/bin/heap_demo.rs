#![no_std]
#![no_main]

#[macro_use]
extern crate user_lib;

use user_lib::{allocate, free};

/// Allocates 40 bytes, writes through the pointer, reads them back, frees
/// the block and exits with code 7.
#[no_mangle]
pub extern "C" fn main() -> i32 {
    let ptr = allocate(40) as *mut u64;
    println!("heap_demo: got block at {:p}", ptr);
    unsafe {
        for i in 0..5 {
            ptr.add(i).write_volatile(0x1111_2222_3333_4444 + i as u64);
        }
        for i in 0..5 {
            assert!(ptr.add(i).read_volatile() == 0x1111_2222_3333_4444 + i as u64);
        }
    }
    println!("heap_demo: 40 bytes verified, freeing");
    free(ptr as *mut u8);
    7
}
