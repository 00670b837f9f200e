//! The host-facing serial object.
//!
//! `SerialIo` owns at most one open device. In [`TransferMode::Sync`] the
//! `read_*`/`write_*` calls block on the device directly. In
//! [`TransferMode::Async`] (the default after open) writes are staged and
//! reads are queued for the worker, and results are collected with the
//! `get_*` pollers once the [`Notifier`] fires.
//!
//! Methods come in pairs: `try_*` returns a [`SerialIoResult`], the plain
//! form logs the error and returns a sentinel (`false`, `0`, `None`).

use crate::codec::{self, decode, DeviceReader, Framing, IntWidth, WriteValue};
use crate::config::Config;
use crate::engine::{AsyncEngine, EngineSettings, SharedDevice};
use crate::error::{SerialIoError, SerialIoResult};
use crate::notifier::Notifier;
use crate::port::{
    BaudRate, DeviceEnumerator, PortConfiguration, SerialPortAdapter, SyncSerialPort,
    SystemEnumerator,
};
use crate::request::{Payload, Request, RequestKind, ResponseInfo, Status};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Whether calls block on the device or go through the request queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferMode {
    Sync,
    #[default]
    Async,
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferMode::Sync => f.write_str("sync"),
            TransferMode::Async => f.write_str("async"),
        }
    }
}

/// Everything tied to one open device.
#[derive(Debug)]
struct Session {
    name: String,
    framing: Framing,
    mode: TransferMode,
    baud_rate: u32,
    device: SharedDevice,
    engine: AsyncEngine,
}

/// A serial device with synchronous and queued asynchronous I/O.
#[derive(Debug)]
pub struct SerialIo {
    settings: EngineSettings,
    port_config: PortConfiguration,
    notifier: Arc<Notifier>,
    enumerator: Arc<dyn DeviceEnumerator>,
    session: Option<Session>,
}

impl Default for SerialIo {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialIo {
    /// A closed serial object with default settings and its own notifier.
    pub fn new() -> Self {
        Self {
            settings: EngineSettings::default(),
            port_config: PortConfiguration::default(),
            notifier: Arc::new(Notifier::new()),
            enumerator: Arc::new(SystemEnumerator),
            session: None,
        }
    }

    /// Take queue sizes, timing and port defaults from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new()
            .with_settings(config.engine_settings())
            .with_port_configuration(config.serial.port_configuration())
    }

    /// Signal `notifier` when responses arrive.
    pub fn with_notifier(mut self, notifier: Arc<Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Resolve device indices through `enumerator`.
    pub fn with_enumerator(mut self, enumerator: impl DeviceEnumerator + 'static) -> Self {
        self.enumerator = Arc::new(enumerator);
        self
    }

    /// Queue sizes and timing for sessions opened from now on.
    ///
    /// # Panics
    /// Opening a device panics if any capacity is zero; configs loaded
    /// through [`ConfigLoader`](crate::config::ConfigLoader) are validated.
    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Default rate and timeout for devices opened by path or index.
    pub fn with_port_configuration(mut self, port_config: PortConfiguration) -> Self {
        self.port_config = port_config;
        self
    }

    pub fn notifier(&self) -> &Arc<Notifier> {
        &self.notifier
    }

    // ------------------------------------------------------------------
    // Open / close
    // ------------------------------------------------------------------

    /// Device identifiers in index order.
    pub fn try_list_devices(&self) -> SerialIoResult<Vec<String>> {
        Ok(self.enumerator.available_devices()?)
    }

    pub fn list_devices(&self) -> Vec<String> {
        self.try_list_devices().unwrap_or_else(|e| {
            e.log("list");
            Vec::new()
        })
    }

    /// Open the `index`th enumerated device.
    pub fn try_open(
        &mut self,
        index: usize,
        framing: Framing,
        baud: BaudRate,
    ) -> SerialIoResult<()> {
        let devices = self.try_list_devices()?;
        let path = devices.get(index).ok_or(SerialIoError::InvalidDevice {
            index,
            available: devices.len(),
        })?;
        self.try_open_path_at(path, framing, baud)
    }

    pub fn open(&mut self, index: usize, framing: Framing, baud: BaudRate) -> bool {
        log_failure(self.try_open(index, framing, baud), "open")
    }

    /// Open a device by path at the configured default rate.
    pub fn try_open_path(&mut self, path: &str, framing: Framing) -> SerialIoResult<()> {
        self.try_open_path_at(path, framing, self.port_config.baud_rate)
    }

    pub fn open_path(&mut self, path: &str, framing: Framing) -> bool {
        log_failure(self.try_open_path(path, framing), "open")
    }

    pub fn try_open_path_at(
        &mut self,
        path: &str,
        framing: Framing,
        baud: BaudRate,
    ) -> SerialIoResult<()> {
        self.close();
        let config = PortConfiguration {
            baud_rate: baud,
            ..self.port_config
        };
        let port = SyncSerialPort::open(path, config).map_err(|source| {
            SerialIoError::DeviceOpenFailure {
                path: path.to_string(),
                source,
            }
        })?;
        self.attach(Box::new(port), framing, baud.bits_per_second());
        Ok(())
    }

    pub fn open_path_at(&mut self, path: &str, framing: Framing, baud: BaudRate) -> bool {
        log_failure(self.try_open_path_at(path, framing, baud), "open")
    }

    /// Open over an adapter the caller has already acquired. The configured
    /// timeout is applied to it.
    pub fn open_with_adapter(&mut self, mut adapter: Box<dyn SerialPortAdapter>, framing: Framing) {
        self.close();
        if let Err(e) = adapter.set_timeout(self.port_config.timeout) {
            warn!("{}: keeping device timeout: {}", adapter.name(), e);
        }
        let baud = adapter
            .baud_rate()
            .unwrap_or(self.port_config.baud_rate.bits_per_second());
        self.attach(adapter, framing, baud);
    }

    fn attach(&mut self, adapter: Box<dyn SerialPortAdapter>, framing: Framing, baud_rate: u32) {
        let name = adapter.name().to_string();
        let device: SharedDevice = Arc::new(Mutex::new(DeviceReader::new(adapter)));
        let engine = AsyncEngine::new(
            name.clone(),
            Arc::clone(&device),
            framing,
            self.settings.clone(),
            Arc::clone(&self.notifier),
        );
        info!("opened {} ({} framing, {} baud)", name, framing, baud_rate);
        self.session = Some(Session {
            name,
            framing,
            mode: TransferMode::default(),
            baud_rate,
            device,
            engine,
        });
    }

    /// Stop the worker and release the device. Staged bytes not yet
    /// written are discarded.
    pub fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.engine.stop();
            let staged = session.engine.staged_bytes();
            if staged > 0 {
                debug!("discarding {} staged byte(s) on close", staged);
            }
            info!("closed {}", session.name);
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    fn session(&self) -> SerialIoResult<&Session> {
        self.session.as_ref().ok_or(SerialIoError::NotOpen)
    }

    fn session_mut(&mut self) -> SerialIoResult<&mut Session> {
        self.session.as_mut().ok_or(SerialIoError::NotOpen)
    }

    /// Device path of the open session.
    pub fn name(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.name.as_str())
    }

    pub fn framing(&self) -> Option<Framing> {
        self.session.as_ref().map(|s| s.framing)
    }

    // ------------------------------------------------------------------
    // Device state
    // ------------------------------------------------------------------

    /// True if input can be read without waiting. Never blocks: if the
    /// worker is using the device this reports false.
    pub fn ready(&self) -> bool {
        self.session
            .as_ref()
            .and_then(|s| s.device.try_lock().map(|d| d.has_input()))
            .unwrap_or(false)
    }

    /// Whether the last read found the input exhausted.
    pub fn eof(&self) -> bool {
        self.session
            .as_ref()
            .and_then(|s| s.device.try_lock().map(|d| d.eof()))
            .unwrap_or(false)
    }

    /// Sync mode: flush the device. Async mode: queue a flush of the
    /// staged bytes.
    pub fn try_flush(&mut self) -> SerialIoResult<()> {
        let session = self.session_mut()?;
        match session.mode {
            TransferMode::Sync => Ok(session.device.lock().port_mut().flush()?),
            TransferMode::Async => {
                session.engine.start_worker()?;
                session.engine.request_flush()
            }
        }
    }

    pub fn flush(&mut self) -> bool {
        log_failure(self.try_flush(), "flush")
    }

    /// Discard unread input, both what the device holds and what was
    /// already read but not decoded. The device's own output buffer is
    /// dropped too; staged writes are untouched.
    pub fn try_clear(&mut self) -> SerialIoResult<()> {
        let session = self.session_mut()?;
        let mut device = session.device.try_lock().ok_or(SerialIoError::DeviceBusy)?;
        let dropped = device.discard_input()?;
        debug!("{}: cleared {} buffered byte(s)", session.name, dropped);
        Ok(())
    }

    pub fn clear(&mut self) -> bool {
        log_failure(self.try_clear(), "clear")
    }

    pub fn mode(&self) -> Option<TransferMode> {
        self.session.as_ref().map(|s| s.mode)
    }

    /// Switch transfer mode. Queued requests and responses are kept.
    pub fn try_set_mode(&mut self, mode: TransferMode) -> SerialIoResult<()> {
        let session = self.session_mut()?;
        if session.mode != mode {
            debug!("{}: {} -> {} mode", session.name, session.mode, mode);
            session.mode = mode;
        }
        Ok(())
    }

    pub fn set_mode(&mut self, mode: TransferMode) -> bool {
        log_failure(self.try_set_mode(mode), "setMode")
    }

    /// Change the line rate. Never waits on the worker: while it holds the
    /// device the call fails with [`SerialIoError::DeviceBusy`].
    pub fn try_set_baud_rate(&mut self, baud: BaudRate) -> SerialIoResult<()> {
        let session = self.session_mut()?;
        let mut device = session.device.try_lock().ok_or(SerialIoError::DeviceBusy)?;
        device.port_mut().set_baud_rate(baud)?;
        drop(device);
        session.baud_rate = baud.bits_per_second();
        info!("{}: baud rate set to {}", session.name, baud);
        Ok(())
    }

    pub fn set_baud_rate(&mut self, baud: BaudRate) -> bool {
        log_failure(self.try_set_baud_rate(baud), "setBaudRate")
    }

    /// Current rate as reported by the device, or the last rate set when
    /// the device cannot say or the worker is using it.
    pub fn try_baud_rate(&self) -> SerialIoResult<u32> {
        let session = self.session()?;
        let reported = session
            .device
            .try_lock()
            .and_then(|d| d.port().baud_rate().ok());
        Ok(reported.unwrap_or(session.baud_rate))
    }

    pub fn baud_rate(&self) -> u32 {
        self.try_baud_rate().unwrap_or_else(|e| {
            e.log("getBaudRate");
            0
        })
    }

    // ------------------------------------------------------------------
    // Sync reads
    // ------------------------------------------------------------------

    fn sync_session(&self, operation: &'static str) -> SerialIoResult<&Session> {
        let session = self.session()?;
        if session.mode != TransferMode::Sync {
            return Err(SerialIoError::WrongTransferMode {
                operation,
                mode: session.mode,
            });
        }
        Ok(session)
    }

    fn ascii_session(&self, operation: &'static str) -> SerialIoResult<&Session> {
        let session = self.sync_session(operation)?;
        if session.framing != Framing::Ascii {
            return Err(SerialIoError::UnsupportedFraming {
                operation,
                framing: session.framing,
            });
        }
        Ok(session)
    }

    /// Read one integer. Binary framing reads `width` bytes as an unsigned
    /// little-endian value; ascii framing parses a decimal, hex (`0x`) or
    /// octal (leading `0`) number and ignores `width`.
    pub fn try_read_int(&self, width: IntWidth) -> SerialIoResult<i64> {
        let session = self.sync_session("readInt")?;
        let mut device = session.device.lock();
        match session.framing {
            Framing::Ascii => {
                decode::scan_int(&mut *device)?.ok_or(SerialIoError::DecodeFailure(RequestKind::Int))
            }
            Framing::Binary => {
                let bytes = decode::read_elements(&mut *device, width.bytes(), 1)?;
                if bytes.is_empty() {
                    return Err(SerialIoError::ShortRead {
                        requested: 1,
                        actual: 0,
                    });
                }
                Ok(decode::decode_uint(&bytes))
            }
        }
    }

    pub fn read_int(&self, width: IntWidth) -> i64 {
        self.try_read_int(width).unwrap_or_else(|e| {
            e.log("readInt");
            0
        })
    }

    /// Read one float: decimal text, or a 4-byte single under binary framing.
    pub fn try_read_float(&self) -> SerialIoResult<f64> {
        let session = self.sync_session("readFloat")?;
        let mut device = session.device.lock();
        match session.framing {
            Framing::Ascii => decode::scan_float(&mut *device)?
                .ok_or(SerialIoError::DecodeFailure(RequestKind::Float)),
            Framing::Binary => {
                let bytes = decode::read_elements(&mut *device, 4, 1)?;
                decode::decode_f32s(&bytes)
                    .first()
                    .copied()
                    .ok_or(SerialIoError::ShortRead {
                        requested: 1,
                        actual: 0,
                    })
            }
        }
    }

    pub fn read_float(&self) -> f64 {
        self.try_read_float().unwrap_or_else(|e| {
            e.log("readFloat");
            0.0
        })
    }

    /// Read one whitespace-delimited token.
    pub fn try_read_string(&self) -> SerialIoResult<String> {
        let session = self.ascii_session("readString")?;
        let token = codec::scan_token(&mut *session.device.lock(), codec::MAX_TOKEN_LEN)?;
        token.ok_or(SerialIoError::DecodeFailure(RequestKind::String))
    }

    pub fn read_string(&self) -> Option<String> {
        self.try_read_string().map_err(|e| e.log("readString")).ok()
    }

    /// Read one line without its terminator.
    pub fn try_read_line(&self) -> SerialIoResult<String> {
        let session = self.ascii_session("readLine")?;
        let limit = self.settings.device_buffer_size.saturating_sub(1).max(1);
        let line = codec::read_line(&mut *session.device.lock(), limit)?;
        line.ok_or(SerialIoError::DecodeFailure(RequestKind::Line))
    }

    pub fn read_line(&self) -> Option<String> {
        self.try_read_line().map_err(|e| e.log("readLine")).ok()
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Encode `value` under the session framing and write it: directly in
    /// sync mode, through the staging buffer in async mode.
    pub fn try_write(&mut self, value: &WriteValue) -> SerialIoResult<()> {
        let session = self.session_mut()?;
        let bytes = codec::encode(value, session.framing);
        match session.mode {
            TransferMode::Sync => Ok(session.device.lock().write_all(&bytes)?),
            TransferMode::Async => {
                session.engine.start_worker()?;
                session.engine.submit_write(&bytes)
            }
        }
    }

    pub fn write(&mut self, value: impl Into<WriteValue>) -> bool {
        log_failure(self.try_write(&value.into()), "write")
    }

    /// Write an integer `size` bytes wide (binary framing). `size` must be
    /// 1, 2, 4 or 8 even under ascii framing.
    pub fn try_write_int(&mut self, value: i64, size: i64) -> SerialIoResult<()> {
        let width = IntWidth::from_bytes(size).ok_or(SerialIoError::InvalidWriteWidth(size))?;
        self.try_write(&WriteValue::Int { value, width })
    }

    pub fn write_int(&mut self, value: i64, size: i64) -> bool {
        log_failure(self.try_write_int(value, size), "writeInt")
    }

    pub fn try_write_ints(&mut self, values: &[i64], size: i64) -> SerialIoResult<()> {
        let width = IntWidth::from_bytes(size).ok_or(SerialIoError::InvalidWriteWidth(size))?;
        self.try_write(&WriteValue::Ints {
            values: values.to_vec(),
            width,
        })
    }

    pub fn write_ints(&mut self, values: &[i64], size: i64) -> bool {
        log_failure(self.try_write_ints(values, size), "writeInts")
    }

    pub fn write_float(&mut self, value: f64) -> bool {
        log_failure(self.try_write(&WriteValue::Float(value)), "writeFloat")
    }

    pub fn write_floats(&mut self, values: &[f64]) -> bool {
        log_failure(self.try_write(&WriteValue::Floats(values.to_vec())), "writeFloats")
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> bool {
        log_failure(self.try_write(&WriteValue::Bytes(bytes.to_vec())), "writeBytes")
    }

    /// Stage `value` for the worker regardless of transfer mode.
    pub fn try_submit_write(&mut self, value: &WriteValue) -> SerialIoResult<()> {
        let session = self.session_mut()?;
        let bytes = codec::encode(value, session.framing);
        session.engine.start_worker()?;
        session.engine.submit_write(&bytes)
    }

    pub fn submit_write(&mut self, value: impl Into<WriteValue>) -> bool {
        log_failure(self.try_submit_write(&value.into()), "writeAsync")
    }

    // ------------------------------------------------------------------
    // Async reads
    // ------------------------------------------------------------------

    /// Queue a read of `count` items of `kind` for the worker.
    pub fn try_submit_read(&mut self, kind: RequestKind, count: usize) -> SerialIoResult<()> {
        let session = self.session_mut()?;
        session.engine.start_worker()?;
        session.engine.submit_read(kind, count)
    }

    pub fn submit_read(&mut self, kind: RequestKind, count: usize) -> bool {
        log_failure(self.try_submit_read(kind, count), "readAsync")
    }

    pub fn request_line(&mut self) -> bool {
        self.submit_read(RequestKind::Line, 1)
    }

    pub fn request_byte(&mut self) -> bool {
        self.submit_read(RequestKind::Byte, 1)
    }

    pub fn request_bytes(&mut self, count: usize) -> bool {
        self.submit_read(RequestKind::Byte, count)
    }

    pub fn request_ints(&mut self, count: usize) -> bool {
        self.submit_read(RequestKind::Int, count)
    }

    pub fn request_floats(&mut self, count: usize) -> bool {
        self.submit_read(RequestKind::Float, count)
    }

    /// Pop the head response if it is a successful `kind` read accepted by
    /// `shape`, and hand over its payload.
    fn take_payload(
        &self,
        operation: &str,
        kind: RequestKind,
        shape: impl FnOnce(&Request) -> bool,
    ) -> Option<Payload> {
        let Some(session) = self.session.as_ref() else {
            SerialIoError::NotOpen.log(operation);
            return None;
        };
        session
            .engine
            .take_response_if(|r| r.kind == kind && r.status == Status::Success && shape(r))
            .map(|r| r.payload)
    }

    pub fn get_line(&self) -> Option<String> {
        match self.take_payload("getLine", RequestKind::Line, |_| true)? {
            Payload::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn get_string(&self) -> Option<String> {
        match self.take_payload("getString", RequestKind::String, |_| true)? {
            Payload::Text(s) => Some(s),
            _ => None,
        }
    }

    /// A single-byte response.
    pub fn get_byte(&self) -> Option<u8> {
        match self.take_payload("getByte", RequestKind::Byte, |r| r.actual_count == 1)? {
            Payload::Byte(b) => Some(b),
            _ => None,
        }
    }

    /// A byte response of any length other than one.
    pub fn get_bytes(&self) -> Option<Vec<u8>> {
        match self.take_payload("getBytes", RequestKind::Byte, |r| r.actual_count != 1)? {
            Payload::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn get_ints(&self) -> Option<Vec<i64>> {
        match self.take_payload("getInts", RequestKind::Int, |_| true)? {
            Payload::Ints(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_floats(&self) -> Option<Vec<f64>> {
        match self.take_payload("getFloats", RequestKind::Float, |_| true)? {
            Payload::Floats(v) => Some(v),
            _ => None,
        }
    }

    /// Kind, status and counts of the head response.
    pub fn peek_response(&self) -> Option<ResponseInfo> {
        self.session.as_ref()?.engine.peek_response()
    }

    /// Pop the head response whatever it is, e.g. to clear a failed read
    /// no getter will accept.
    pub fn take_response(&self) -> Option<Request> {
        self.session.as_ref()?.engine.take_response()
    }

    pub fn pending_requests(&self) -> usize {
        self.session
            .as_ref()
            .map_or(0, |s| s.engine.pending_requests())
    }

    pub fn pending_responses(&self) -> usize {
        self.session
            .as_ref()
            .map_or(0, |s| s.engine.pending_responses())
    }
}

impl Drop for SerialIo {
    fn drop(&mut self) {
        self.close();
    }
}

fn log_failure(result: SerialIoResult<()>, operation: &str) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            e.log(operation);
            false
        }
    }
}
