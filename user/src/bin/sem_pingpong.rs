#![no_std]
#![no_main]

#[macro_use]
extern crate user_lib;

use user_lib::{exit, fork, sem_new, sem_p, sem_v};

/// Mutual exclusion through a one-permit semaphore across fork, plus a
/// zero-permit rendezvous the parent P-s only after the child V-s.
#[no_mangle]
pub extern "C" fn main() -> i32 {
    let mutex = sem_new(1);
    let done = sem_new(0);
    let pid = fork();
    if pid == 0 {
        sem_p(mutex);
        println!("child: inside the critical section");
        sem_v(mutex);
        sem_v(done);
        exit(0);
    }
    sem_p(mutex);
    println!("parent: inside the critical section");
    sem_v(mutex);
    sem_p(done);
    println!("parent: child signalled completion");
    0
}
