//! Shared concurrency primitives used by the index writer and the query
//! executor: a busy-wait mutex for very short critical sections, a
//! writer-preference reader/writer mutex and a dynamically sized thread pool.

pub mod busywait_mutex;
pub mod read_write_mutex;
pub mod thread_pool;

pub use busywait_mutex::BusyWaitMutex;
pub use read_write_mutex::ReadWriteMutex;
pub use thread_pool::ThreadPool;

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID: Cell<u64> = const { Cell::new(0) };
}

/// A process-unique id for the calling thread.
///
/// `std::thread::ThreadId` cannot be stored in an atomic, so the locks in
/// this module mint their own. Id `0` is never handed out; it is the
/// "unowned" sentinel of the lock owner fields.
pub(crate) fn thread_id() -> u64 {
    THREAD_ID.with(|cell| {
        let mut id = cell.get();
        if id == 0 {
            id = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
            cell.set(id);
        }
        id
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_ids_are_stable_and_unique() {
        let here = thread_id();
        assert_ne!(0, here);
        assert_eq!(here, thread_id());

        let other = std::thread::spawn(thread_id).join().unwrap();
        assert_ne!(0, other);
        assert_ne!(here, other);
    }
}
