//! Lock policies sinks are built with

use parking_lot::Mutex;
use std::cell::RefCell;

/// Exclusive access to a value for the duration of a closure.
pub trait Lockable<T> {
    /// Wrap `value`
    fn new(value: T) -> Self
    where
        Self: Sized;

    /// Acquire, run `f`, release.
    fn with_lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> R;
}

impl<T> Lockable<T> for Mutex<T> {
    fn new(value: T) -> Self {
        Mutex::new(value)
    }

    #[inline]
    fn with_lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.lock())
    }
}

/// Lock that performs no synchronization, for single-threaded sinks.
///
/// Not `Sync`, so it cannot be shared across threads. Re-entering it from
/// inside `with_lock` panics.
#[derive(Debug, Default)]
pub struct NullLock<T>(RefCell<T>);

impl<T> Lockable<T> for NullLock<T> {
    fn new(value: T) -> Self {
        Self(RefCell::new(value))
    }

    #[inline]
    fn with_lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }
}

/// Chooses the lock type a sink guards its state with.
pub trait LockPolicy {
    /// The lock wrapping a value of type `T`
    type Lock<T>: Lockable<T>;
}

/// Multi-threaded policy: a `parking_lot` mutex.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mt;

impl LockPolicy for Mt {
    type Lock<T> = Mutex<T>;
}

/// Single-threaded policy: no locking.
#[derive(Debug, Clone, Copy, Default)]
pub struct St;

impl LockPolicy for St {
    type Lock<T> = NullLock<T>;
}
