//! The worker thread that services queued requests.

use super::router::RequestRouter;
use super::Shared;
use crate::error::SerialIoError;
use crate::request::RequestKind;
use std::io;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error};

/// Drain the request queue once.
///
/// Write triggers flush the staging buffer. Reads are serviced and pushed
/// as responses, unless the response queue is already full, in which case
/// the read is dropped before the device is touched. The notifier fires
/// once if at least one response was produced. Returns that count.
pub(crate) fn run_cycle(shared: &Shared, router: &mut RequestRouter) -> usize {
    let mut produced = 0;
    loop {
        // Lock released before any device call.
        let next = shared.requests.lock().get();
        let Some(mut request) = next else {
            break;
        };

        if request.kind == RequestKind::Write {
            router.flush_staged(&shared.staging);
            continue;
        }

        if shared.responses.lock().at_capacity() {
            SerialIoError::ResponseQueueOverflow(request.kind).log("worker");
            continue;
        }

        router.route(&mut request);

        let kind = request.kind;
        if shared.responses.lock().put(request).is_err() {
            SerialIoError::ResponseQueueOverflow(kind).log("worker");
            continue;
        }
        produced += 1;
    }

    if produced > 0 {
        shared.notifier.notify();
    }
    produced
}

/// Handle to the running worker thread. Joins on drop.
#[derive(Debug)]
pub(crate) struct Worker {
    handle: Option<JoinHandle<()>>,
    shared: Arc<Shared>,
    name: String,
}

impl Worker {
    pub fn spawn(
        name: String,
        shared: Arc<Shared>,
        mut router: RequestRouter,
        poll_interval: Duration,
    ) -> io::Result<Self> {
        shared.stop.store(false, Ordering::Release);
        let thread_shared = Arc::clone(&shared);

        let handle = thread::Builder::new().name(name.clone()).spawn(move || {
            debug!("worker started");
            while !thread_shared.stop.load(Ordering::Acquire) {
                run_cycle(&thread_shared, &mut router);
                thread::sleep(poll_interval);
            }
            debug!("worker stopped");
        })?;

        Ok(Self {
            handle: Some(handle),
            shared,
            name,
        })
    }

    /// Signal the worker and wait for its current cycle to finish.
    pub fn stop(&mut self) {
        self.shared.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("worker thread {} panicked", self.name);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
    }
}
