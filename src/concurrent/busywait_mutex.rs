use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use super::thread_id;

/// Non-reentrant exclusive lock that spins instead of parking the thread.
///
/// The owner field holds either [`BusyWaitMutex::UNOWNED`] or the id of the
/// holding thread. Only suitable for critical sections that are a handful of
/// instructions long; a thread must never block while holding it.
#[derive(Debug, Default)]
pub struct BusyWaitMutex {
    owner: AtomicU64,
}

impl BusyWaitMutex {
    /// Sentinel owner value: no thread holds the lock.
    pub const UNOWNED: u64 = 0;

    pub fn new() -> BusyWaitMutex {
        BusyWaitMutex { owner: AtomicU64::new(Self::UNOWNED) }
    }

    /// Spins until the lock is acquired, yielding to the scheduler between
    /// attempts. Re-locking from the owning thread is a programming error.
    pub fn lock(&self) {
        let this_thread = thread_id();

        loop {
            match self.owner.compare_exchange(
                Self::UNOWNED,
                this_thread,
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => return,
                Err(current) => {
                    debug_assert_ne!(current, this_thread, "recursive lock acquisition");
                    thread::yield_now();
                }
            }
        }
    }

    /// Single compare-and-swap attempt.
    pub fn try_lock(&self) -> bool {
        self.owner
            .compare_exchange(Self::UNOWNED, thread_id(), Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Releases the lock. The calling thread must be the owner.
    ///
    /// Owner ids are plain integers here, so value equality is bit equality
    /// and a single compare-and-swap settles ownership.
    pub fn unlock(&self) {
        let this_thread = thread_id();
        let unlocked = self
            .owner
            .compare_exchange(this_thread, Self::UNOWNED, Ordering::Release, Ordering::Relaxed)
            .is_ok();
        debug_assert!(unlocked, "unlock of a mutex not owned by the current thread");
    }
}

impl Drop for BusyWaitMutex {
    fn drop(&mut self) {
        // destroying a locked mutex is a programming error
        debug_assert_eq!(Self::UNOWNED, *self.owner.get_mut());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn lock_unlock() {
        let mutex = BusyWaitMutex::new();
        mutex.lock();
        assert!(!mutex.try_lock());
        mutex.unlock();
        assert!(mutex.try_lock());
        mutex.unlock();
    }

    #[test]
    fn contended_counter() {
        let mutex = Arc::new(BusyWaitMutex::new());
        let counter = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let mutex = Arc::clone(&mutex);
            let counter = Arc::clone(&counter);
            handles.push(std::thread::spawn(move || {
                for _ in 0..1000 {
                    mutex.lock();
                    counter.fetch_add(1, Ordering::Relaxed);
                    mutex.unlock();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(4000, counter.load(Ordering::Relaxed));
    }
}
