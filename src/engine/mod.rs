//! Asynchronous request engine.
//!
//! The caller thread enqueues read requests and staged write bytes and
//! polls for completed responses. A single worker thread owns all blocking
//! device I/O. Neither side ever blocks on the other: every queue is
//! bounded, and a full queue drops the newest item with a severe log
//! instead of waiting.

mod router;
mod worker;

pub use router::RequestRouter;

use crate::buffer::CircularBuffer;
use crate::codec::{DeviceReader, Framing};
use crate::error::{SerialIoError, SerialIoResult};
use crate::notifier::Notifier;
use crate::request::{Request, RequestKind, ResponseInfo};
use parking_lot::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use worker::Worker;

/// The device as shared between the caller and the worker.
pub type SharedDevice = Arc<Mutex<DeviceReader>>;

/// Queue sizes and timing for one engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub request_capacity: usize,
    pub response_capacity: usize,
    pub write_buffer_capacity: usize,
    /// Upper bound on a single device transfer.
    pub device_buffer_size: usize,
    /// Sleep between worker cycles.
    pub poll_interval: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            request_capacity: 32,
            response_capacity: 32,
            write_buffer_capacity: 1024,
            device_buffer_size: 1024,
            poll_interval: Duration::from_micros(100),
        }
    }
}

/// State visible to both the caller and the worker.
#[derive(Debug)]
pub(crate) struct Shared {
    requests: Mutex<CircularBuffer<Request>>,
    responses: Mutex<CircularBuffer<Request>>,
    staging: Mutex<CircularBuffer<u8>>,
    stop: AtomicBool,
    notifier: Arc<Notifier>,
}

/// Request/response queues plus the worker servicing them.
#[derive(Debug)]
pub struct AsyncEngine {
    shared: Arc<Shared>,
    device: SharedDevice,
    framing: Framing,
    settings: EngineSettings,
    name: String,
    worker: Option<Worker>,
    /// Used by [`run_cycle`](Self::run_cycle) while no worker is running.
    local_router: Option<RequestRouter>,
}

impl AsyncEngine {
    pub fn new(
        name: impl Into<String>,
        device: SharedDevice,
        framing: Framing,
        settings: EngineSettings,
        notifier: Arc<Notifier>,
    ) -> Self {
        let shared = Shared {
            requests: Mutex::new(CircularBuffer::new(settings.request_capacity)),
            responses: Mutex::new(CircularBuffer::new(settings.response_capacity)),
            staging: Mutex::new(CircularBuffer::new(settings.write_buffer_capacity)),
            stop: AtomicBool::new(false),
            notifier,
        };
        Self {
            shared: Arc::new(shared),
            device,
            framing,
            settings,
            name: name.into(),
            worker: None,
            local_router: None,
        }
    }

    fn router(&self) -> RequestRouter {
        RequestRouter::new(
            Arc::clone(&self.device),
            self.framing,
            self.settings.device_buffer_size,
        )
    }

    /// Start the worker thread if it is not already running.
    pub fn start_worker(&mut self) -> SerialIoResult<()> {
        if self.worker.is_some() {
            return Ok(());
        }
        let worker = Worker::spawn(
            format!("serial-io:{}", self.name),
            Arc::clone(&self.shared),
            self.router(),
            self.settings.poll_interval,
        )
        .map_err(|e| SerialIoError::Port(e.into()))?;
        info!("started worker for {}", self.name);
        self.worker = Some(worker);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(Worker::is_running)
    }

    /// Stop and join the worker. The queues keep their contents.
    pub fn stop(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.stop();
            debug!("stopped worker for {}", self.name);
        }
    }

    /// Run one worker cycle on the calling thread.
    ///
    /// Returns `None` while the worker thread is running, since it owns
    /// the cycle then.
    pub fn run_cycle(&mut self) -> Option<usize> {
        if self.worker.is_some() {
            return None;
        }
        if self.local_router.is_none() {
            self.local_router = Some(self.router());
        }
        let router = self.local_router.as_mut()?;
        Some(worker::run_cycle(&self.shared, router))
    }

    /// Enqueue a read of `count` items of `kind`.
    pub fn submit_read(&self, kind: RequestKind, count: usize) -> SerialIoResult<()> {
        if !kind.is_read() {
            return Err(SerialIoError::InvalidRequestKind(kind));
        }
        self.shared
            .requests
            .lock()
            .put(Request::read(kind, count))
            .map_err(|_| SerialIoError::RequestQueueOverflow(kind))
    }

    /// Stage `bytes` and enqueue a flush trigger for them.
    ///
    /// The payload is staged whole or not at all. If the trigger cannot be
    /// enqueued the bytes are unstaged again, so a rejected write never
    /// reaches the device.
    pub fn submit_write(&self, bytes: &[u8]) -> SerialIoResult<()> {
        let mut staging = self.shared.staging.lock();
        if !staging.put_slice(bytes) {
            return Err(SerialIoError::StagingOverflow {
                dropped: bytes.len(),
                free: staging.remaining(),
            });
        }
        self.enqueue_trigger().map_err(|e| {
            staging.truncate_back(bytes.len());
            e
        })
    }

    /// Enqueue a flush trigger without staging anything.
    pub fn request_flush(&self) -> SerialIoResult<()> {
        let _staging = self.shared.staging.lock();
        self.enqueue_trigger()
    }

    fn enqueue_trigger(&self) -> SerialIoResult<()> {
        self.shared
            .requests
            .lock()
            .put(Request::write_trigger())
            .map_err(|_| SerialIoError::RequestQueueOverflow(RequestKind::Write))
    }

    /// Pop the head response if `accept` says so. A rejected head stays
    /// where it is.
    pub fn take_response_if(&self, accept: impl FnOnce(&Request) -> bool) -> Option<Request> {
        self.shared.responses.lock().get_if(accept)
    }

    /// Pop the head response unconditionally.
    pub fn take_response(&self) -> Option<Request> {
        self.shared.responses.lock().get()
    }

    pub fn peek_response(&self) -> Option<ResponseInfo> {
        self.shared.responses.lock().peek().map(ResponseInfo::from)
    }

    pub fn pending_requests(&self) -> usize {
        self.shared.requests.lock().len()
    }

    pub fn pending_responses(&self) -> usize {
        self.shared.responses.lock().len()
    }

    pub fn staged_bytes(&self) -> usize {
        self.shared.staging.lock().len()
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn notifier(&self) -> &Arc<Notifier> {
        &self.shared.notifier
    }
}

impl Drop for AsyncEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
