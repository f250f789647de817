//! Reader/writer lock with a version stamp.
//!
//! Readers first try a non-blocking shared acquisition and only park when a
//! writer holds the lock. Every released write guard advances the version,
//! so a caller can take a `stamp`, perform several reads and `validate` that
//! no write landed in between.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{RwLock, RwLockWriteGuard};

pub struct OptimisticLock<T> {
    version: AtomicU64,
    lock: RwLock<T>,
}

pub struct WriteGuard<'a, T> {
    guard: RwLockWriteGuard<'a, T>,
    version: &'a AtomicU64,
}

impl<T> OptimisticLock<T> {
    pub fn new(value: T) -> Self {
        Self {
            version: AtomicU64::new(0),
            lock: RwLock::new(value),
        }
    }

    /// Current version; changes whenever a write guard is released.
    #[inline]
    pub fn stamp(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Whether no write completed since `stamp` was taken.
    #[inline]
    pub fn validate(&self, stamp: u64) -> bool {
        self.stamp() == stamp
    }

    /// Run `f` under shared access.
    ///
    /// Uncontended reads take the lock without parking. The held guard is
    /// what keeps the view consistent; the stamp is for callers spanning
    /// several reads.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        if let Some(guard) = self.lock.try_read() {
            return f(&guard);
        }
        f(&self.lock.read())
    }

    /// Exclusive access; the version advances when the guard drops.
    pub fn write(&self) -> WriteGuard<'_, T> {
        WriteGuard {
            guard: self.lock.write(),
            version: &self.version,
        }
    }

    pub fn into_inner(self) -> T {
        self.lock.into_inner()
    }
}

impl<T> Deref for WriteGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for WriteGuard<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> Drop for WriteGuard<'_, T> {
    fn drop(&mut self) {
        // Still holding the lock here, so readers that validate after
        // acquiring it see the new version.
        self.version.fetch_add(1, Ordering::Release);
    }
}
