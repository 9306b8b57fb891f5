use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A thread-safe, reference-counted resource container with read-write locking.
///
/// `MtResource` provides synchronized access to a value of type `T` that can be shared
/// across threads. Clones share the same underlying value.
///
/// Lock poisoning is recovered rather than propagated: every writer in this crate
/// publishes its change with a single infallible operation, so a panic while a guard
/// was held cannot leave the value half-updated.
///
/// # Examples
///
/// ```
/// use voxel_renderer::core::MtResource;
///
/// let counter = MtResource::new(0);
/// let shared = counter.clone();
///
/// std::thread::spawn(move || *shared.get_mut() += 1)
///     .join()
///     .unwrap();
///
/// assert_eq!(*counter.get(), 1);
/// ```
pub struct MtResource<T: Send + Sync> {
    resource: Arc<RwLock<T>>,
}

impl<T: Send + Sync> MtResource<T> {
    /// Creates a new `MtResource` containing the given value.
    pub fn new(resource: T) -> Self {
        Self {
            resource: Arc::new(RwLock::new(resource)),
        }
    }

    /// Returns a guard that allows reading the contained value.
    ///
    /// Concurrent readers do not block each other.
    pub fn get(&self) -> RwLockReadGuard<'_, T> {
        self.resource.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a guard that allows modifying the contained value.
    ///
    /// Blocks until every other guard has been dropped.
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.resource.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Send + Sync> Clone for MtResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}

impl<T: Send + Sync + Default> Default for MtResource<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_value() {
        let a = MtResource::new(vec![1]);
        let b = a.clone();
        b.get_mut().push(2);
        assert_eq!(*a.get(), vec![1, 2]);
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let resource = MtResource::new(5);
        let shared = resource.clone();
        let _ = std::thread::spawn(move || {
            let _guard = shared.get_mut();
            panic!("poison the lock");
        })
        .join();

        assert_eq!(*resource.get(), 5);
        *resource.get_mut() = 6;
        assert_eq!(*resource.get(), 6);
    }
}
