use core::{
    ops::{Deref, DerefMut},
    sync::atomic::{AtomicBool, Ordering},
};

use spin::{Mutex, MutexGuard};

/// A spin mutex paired with a "protected" flag.
///
/// The flag is raised right after the mutex is taken with [ProtectedLock::lock] and
/// lowered right before it is given back, so it is set for the whole duration of
/// every structural operation. Readers on the fast path test the flag first and only
/// [ProtectedLock::try_lock_unprotected] when it is clear; this never spins.
pub struct ProtectedLock<T: ?Sized> {
    protected: AtomicBool,
    inner: Mutex<T>,
}

impl<T> ProtectedLock<T> {
    pub const fn new(value: T) -> ProtectedLock<T> {
        ProtectedLock {
            protected: AtomicBool::new(false),
            inner: Mutex::new(value),
        }
    }
}

impl<T: ?Sized> ProtectedLock<T> {
    /// Take the lock for a structural operation, spinning until it is free.
    pub fn lock(&self) -> ProtectedGuard<'_, T> {
        let guard = self.inner.lock();
        self.protected.store(true, Ordering::Release);
        ProtectedGuard {
            flag: &self.protected,
            inner: Some(guard),
        }
    }

    /// Whether a structural operation is in flight.
    pub fn is_protected(&self) -> bool {
        self.protected.load(Ordering::Acquire)
    }

    /// Try to take the lock for a short read-only lookup without raising the flag.
    ///
    /// Return [None] if a structural operation is in flight or the lock is busy.
    pub fn try_lock_unprotected(&self) -> Option<MutexGuard<'_, T>> {
        if self.is_protected() {
            return None;
        }
        self.inner.try_lock()
    }
}

// region: ProtectedGuard

pub struct ProtectedGuard<'a, T: ?Sized> {
    flag: &'a AtomicBool,
    inner: Option<MutexGuard<'a, T>>,
}

impl<T: ?Sized> Drop for ProtectedGuard<'_, T> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        self.inner = None; // unlock after the flag is lowered
    }
}

impl<T: ?Sized> Deref for ProtectedGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        match &self.inner {
            Some(guard) => &**guard,
            None => unreachable!("guard is only emptied on drop"),
        }
    }
}

impl<T: ?Sized> DerefMut for ProtectedGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match &mut self.inner {
            Some(guard) => &mut **guard,
            None => unreachable!("guard is only emptied on drop"),
        }
    }
}

// endregion
