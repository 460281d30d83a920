mod semaphore;
mod up;

pub use semaphore::{sem_create, sem_get, Semaphore};
pub use up::UPSafeCell;
