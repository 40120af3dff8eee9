use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use super::busywait_mutex::BusyWaitMutex;
use super::thread_id;

/// How long a waiter sleeps before re-checking its predicate. The condvar
/// notifications from `unlock` can race with a waiter that has not started
/// waiting yet; the periodic re-check bounds the damage of a lost wakeup.
const WAIT_INTERVAL: Duration = Duration::from_millis(1000);

/// Reader/writer mutex with writer preference.
///
/// Any number of readers may hold the lock concurrently unless a writer is
/// waiting, in which case new readers stand aside until the writer has been
/// served. Under a continuous stream of writers, readers can starve; that is
/// the documented trade-off of preferring writers.
///
/// `unlock` is deliberately a single entry point for both lock kinds: a
/// write unlock is recognized by the recorded owner thread, anything else is
/// treated as a read unlock.
#[derive(Debug, Default)]
pub struct ReadWriteMutex {
    mutex: Mutex<Counts>,
    reader_cond: Condvar,
    writer_cond: Condvar,
    exclusive_owner: AtomicU64,
}

#[derive(Debug, Default)]
struct Counts {
    /// Active readers.
    concurrent: usize,
    /// Writers waiting in `lock_write`.
    exclusive_waiting: usize,
}

impl ReadWriteMutex {
    pub fn new() -> ReadWriteMutex {
        ReadWriteMutex::default()
    }

    pub fn lock_read(&self) {
        let mut counts = self.mutex.lock();

        // yield to writers that are already waiting
        while counts.exclusive_waiting > 0 {
            let timed_out = self.reader_cond.wait_for(&mut counts, WAIT_INTERVAL).timed_out();
            if !timed_out {
                break;
            }
        }

        counts.concurrent += 1;
    }

    pub fn lock_write(&self) {
        let mut counts = self.mutex.lock();
        counts.exclusive_waiting += 1; // mark writer-waiting so new readers hold back

        while counts.concurrent > 0 {
            let _ = self.writer_cond.wait_for(&mut counts, WAIT_INTERVAL);
        }

        counts.exclusive_waiting -= 1;
        self.exclusive_owner.store(thread_id(), Ordering::Release);
        // keep the internal mutex held until unlock()
        std::mem::forget(counts);
    }

    pub fn try_lock_read(&self) -> bool {
        match self.mutex.try_lock() {
            Some(mut counts) => {
                counts.concurrent += 1;
                true
            }
            None => false,
        }
    }

    pub fn try_lock_write(&self) -> bool {
        let Some(counts) = self.mutex.try_lock() else {
            return false;
        };
        if counts.concurrent > 0 {
            return false;
        }
        self.exclusive_owner.store(thread_id(), Ordering::Release);
        std::mem::forget(counts);
        true
    }

    /// Releases either kind of lock held by the calling thread.
    pub fn unlock(&self) {
        // a write unlock: the internal mutex is still held from lock_write
        if self.exclusive_owner.load(Ordering::Acquire) == thread_id() {
            self.exclusive_owner.store(BusyWaitMutex::UNOWNED, Ordering::Release);
            // SAFETY: lock_write/try_lock_write forgot the guard, leaving the
            // internal mutex locked by this thread.
            unsafe { self.mutex.force_unlock() };
            // both classes re-check their predicates, waking both is safe
            self.reader_cond.notify_all();
            self.writer_cond.notify_all();
            return;
        }

        // read unlock
        {
            let mut counts = self.mutex.lock();
            debug_assert!(counts.concurrent > 0, "read unlock without a read lock");
            counts.concurrent = counts.concurrent.saturating_sub(1);
        }
        // a writer may be waiting on the condvar already; notify
        // unconditionally so it re-checks the reader count
        self.writer_cond.notify_all();
    }
}

/// RAII shared lock; releases on drop.
pub struct ReadGuard<'a>(&'a ReadWriteMutex);

/// RAII exclusive lock; releases on drop.
pub struct WriteGuard<'a>(&'a ReadWriteMutex);

impl ReadWriteMutex {
    pub fn read_guard(&self) -> ReadGuard<'_> {
        self.lock_read();
        ReadGuard(self)
    }

    pub fn write_guard(&self) -> WriteGuard<'_> {
        self.lock_write();
        WriteGuard(self)
    }
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        self.0.unlock();
    }
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.0.unlock();
    }
}
