use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Multi-reader/single-writer lock protecting one mutable provider.
///
/// A `Guard` is created once when its provider opens and dropped when the
/// provider closes. Acquisitions are not reentrant: taking `read` while the
/// same thread already holds `write` (or vice versa) deadlocks.
#[derive(Debug, Default)]
pub struct Guard<T> {
    lock: RwLock<T>,
}

impl<T> Guard<T> {
    pub fn new(value: T) -> Self {
        Self {
            lock: RwLock::new(value),
        }
    }

    /// Acquire shared mode. Blocks only while a writer holds the guard.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.lock.read()
    }

    /// Acquire exclusive mode. Blocks until all readers have released.
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.lock.write()
    }

    /// Acquire exclusive mode only if no reader or writer holds the guard.
    #[inline]
    pub fn try_write(&self) -> Option<RwLockWriteGuard<'_, T>> {
        self.lock.try_write()
    }

    /// Access the protected state without locking; requires unique ownership.
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        self.lock.get_mut()
    }
}
