use crate::sync::{sem_create, sem_get};

pub fn sys_sem_new(initial: usize) -> isize {
    sem_create(initial) as isize
}

pub fn sys_sem_p(id: usize) -> isize {
    let semaphore = sem_get(id);
    semaphore.down();
    0
}

pub fn sys_sem_v(id: usize) -> isize {
    let semaphore = sem_get(id);
    semaphore.up();
    0
}
