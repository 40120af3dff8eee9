use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use log::error;
use parking_lot::{Condvar, Mutex};

use super::thread_id;

type Task = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Accepting and executing tasks.
    Run,
    /// Draining the queue, then terminating.
    Finish,
    /// Discarding the queue, terminating after the in-flight tasks.
    Abort,
}

struct Inner {
    queue: VecDeque<Task>,
    /// Handles of live workers, keyed by their crate thread id. A worker that
    /// exits due to the idle cap removes its own entry and the handle is
    /// dropped (detached) rather than joined, to avoid a self-join.
    workers: Vec<(u64, thread::JoinHandle<()>)>,
    /// Workers currently executing a task.
    active: usize,
    max_threads: usize,
    max_idle: usize,
    state: State,
}

/// Dynamically sized worker pool with FIFO dispatch.
///
/// The pool grows on demand up to `max_threads` and shrinks back when more
/// than `max_idle` workers sit idle. Failed tasks are logged and never take
/// a worker down.
pub struct ThreadPool {
    shared: Arc<Shared>,
}

struct Shared {
    inner: Mutex<Inner>,
    cond: Condvar,
}

impl ThreadPool {
    pub fn new(max_threads: usize, max_idle: usize) -> ThreadPool {
        ThreadPool {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    queue: VecDeque::new(),
                    workers: Vec::new(),
                    active: 0,
                    max_threads,
                    max_idle,
                    state: State::Run,
                }),
                cond: Condvar::new(),
            }),
        }
    }

    /// A pool sized to the host: one worker per logical cpu, all of them
    /// allowed to idle.
    pub fn for_num_cpus() -> ThreadPool {
        let threads = num_cpus::get();
        ThreadPool::new(threads, threads)
    }

    /// Enqueues `task`. Returns `false` if the pool is no longer running.
    pub fn run<F>(&self, task: F) -> bool
    where F: FnOnce() + Send + 'static {
        let mut inner = self.shared.inner.lock();

        if inner.state != State::Run {
            return false;
        }

        inner.queue.push_back(Box::new(task));
        self.shared.cond.notify_one();

        if inner.active == inner.workers.len() && inner.workers.len() < inner.max_threads {
            Self::spawn_worker(&self.shared, &mut inner);
        }

        true
    }

    /// Stops the pool and blocks until every worker has exited.
    ///
    /// With `skip_pending == false` the queue is drained first; with
    /// `skip_pending == true` queued tasks are discarded and only tasks
    /// already being executed run to completion. Idempotent after the first
    /// call.
    pub fn stop(&self, skip_pending: bool) {
        let mut inner = self.shared.inner.lock();

        if inner.state != State::Run {
            return;
        }

        inner.state = if skip_pending { State::Abort } else { State::Finish };

        while !inner.workers.is_empty() {
            self.shared.cond.notify_all();
            self.shared.cond.wait(&mut inner);
        }
    }

    pub fn max_threads(&self) -> usize {
        self.shared.inner.lock().max_threads
    }

    pub fn set_max_threads(&self, value: usize) {
        let mut inner = self.shared.inner.lock();
        inner.max_threads = value;

        // grow immediately if work is already queued
        if inner.state != State::Abort
            && !inner.queue.is_empty()
            && inner.active == inner.workers.len()
            && inner.workers.len() < inner.max_threads
        {
            Self::spawn_worker(&self.shared, &mut inner);
        }

        self.shared.cond.notify_all(); // idle threads may need to exit
    }

    /// Adjusts `max_threads` by `delta`, saturating instead of wrapping.
    pub fn max_threads_delta(&self, delta: isize) {
        let mut inner = self.shared.inner.lock();
        inner.max_threads = if delta >= 0 {
            inner.max_threads.saturating_add(delta as usize)
        } else {
            inner.max_threads.saturating_sub(delta.unsigned_abs())
        };

        if inner.state != State::Abort
            && !inner.queue.is_empty()
            && inner.active == inner.workers.len()
            && inner.workers.len() < inner.max_threads
        {
            Self::spawn_worker(&self.shared, &mut inner);
        }

        self.shared.cond.notify_all();
    }

    pub fn max_idle(&self) -> usize {
        self.shared.inner.lock().max_idle
    }

    pub fn set_max_idle(&self, value: usize) {
        let mut inner = self.shared.inner.lock();
        inner.max_idle = value;
        self.shared.cond.notify_all(); // idle threads may need to exit
    }

    /// Adjusts `max_idle` by `delta`, saturating instead of wrapping.
    pub fn max_idle_delta(&self, delta: isize) {
        let mut inner = self.shared.inner.lock();
        inner.max_idle = if delta >= 0 {
            inner.max_idle.saturating_add(delta as usize)
        } else {
            inner.max_idle.saturating_sub(delta.unsigned_abs())
        };
        self.shared.cond.notify_all();
    }

    /// Tasks currently being executed.
    pub fn tasks_active(&self) -> usize {
        self.shared.inner.lock().active
    }

    /// Tasks waiting in the queue.
    pub fn tasks_pending(&self) -> usize {
        self.shared.inner.lock().queue.len()
    }

    /// Live worker threads.
    pub fn threads(&self) -> usize {
        self.shared.inner.lock().workers.len()
    }

    fn spawn_worker(shared: &Arc<Shared>, inner: &mut Inner) {
        let shared = Arc::clone(shared);
        let (id_tx, id_rx) = crossbeam_channel::bounded(1);
        let handle = thread::spawn(move || {
            let _ = id_tx.send(thread_id());
            Self::worker_loop(&shared);
        });
        // the worker reports its crate-level thread id right after starting
        let id = id_rx.recv().expect("worker thread died before reporting its id");
        inner.workers.push((id, handle));
    }

    fn worker_loop(shared: &Arc<Shared>) {
        let mut inner = shared.inner.lock();

        inner.active += 1;

        loop {
            if inner.state != State::Abort
                && !inner.queue.is_empty()
                && inner.workers.len() <= inner.max_threads
            {
                let task = inner.queue.pop_front().expect("queue checked non-empty");

                // more work but nobody idle: grow the pool before running
                if !inner.queue.is_empty()
                    && inner.active == inner.workers.len()
                    && inner.workers.len() < inner.max_threads
                {
                    Self::spawn_worker(shared, &mut inner);
                }

                drop(inner);

                if let Err(failure) = catch_unwind(AssertUnwindSafe(task)) {
                    // a failed task never terminates the worker
                    error!("thread pool task failed: {:?}", failure);
                }

                inner = shared.inner.lock();
                continue;
            }

            inner.active -= 1;

            if inner.state == State::Run
                && inner.workers.len() <= inner.max_threads
                && inner.workers.len() - inner.active <= inner.max_idle
            {
                shared.cond.wait(&mut inner);
                inner.active += 1;
                continue;
            }

            // too many idle threads, or the pool is stopping: leave
            let this_id = thread_id();
            if let Some(pos) = inner.workers.iter().position(|(id, _)| *id == this_id) {
                // swap with the last entry and pop; dropping the handle
                // detaches the thread, which sidesteps a self-join
                let (_, handle) = inner.workers.swap_remove(pos);
                drop(handle);
            }

            if inner.state != State::Run {
                shared.cond.notify_all(); // wake ThreadPool::stop
            }

            return;
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.stop(true);
    }
}
