use core::cell::{RefCell, RefMut};

/// Wrapper that grants exclusive access to the inner value on a single hart.
///
/// Safe only because this kernel never runs more than one hart: there is no
/// concurrent mutation, so a RefCell borrow check is all the discipline needed.
pub struct UPSafeCell<T> {
    inner: RefCell<T>,
}

unsafe impl<T> Sync for UPSafeCell<T> {}

impl<T> UPSafeCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: RefCell::new(value),
        }
    }

    /// Panics if the value is already borrowed.
    pub fn exclusive_access(&self) -> RefMut<'_, T> {
        self.inner.borrow_mut()
    }
}
