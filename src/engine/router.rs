//! Servicing of individual requests on the worker thread.

use super::SharedDevice;
use crate::buffer::CircularBuffer;
use crate::codec::{self, decode, Framing};
use crate::error::SerialIoError;
use crate::port::PortError;
use crate::request::{Payload, Request, RequestKind};
use parking_lot::Mutex;
use tracing::{debug, error, warn};

/// Element widths of the binary read kinds.
const BYTE_WIDTH: usize = 1;
const INT_WIDTH: usize = 4;
const FLOAT_WIDTH: usize = 4;

/// Performs the blocking device calls a request asks for.
#[derive(Debug)]
pub struct RequestRouter {
    device: SharedDevice,
    framing: Framing,
    /// Bound on a single device transfer, in bytes.
    buffer_size: usize,
    scratch: Vec<u8>,
}

impl RequestRouter {
    pub fn new(device: SharedDevice, framing: Framing, buffer_size: usize) -> Self {
        Self {
            device,
            framing,
            buffer_size,
            scratch: Vec::with_capacity(buffer_size),
        }
    }

    /// Write out everything currently staged, at most `buffer_size` bytes
    /// per device write, flushing after each.
    pub fn flush_staged(&mut self, staging: &Mutex<CircularBuffer<u8>>) {
        loop {
            self.scratch.clear();
            let n = staging.lock().drain_into(&mut self.scratch, self.buffer_size);
            if n == 0 {
                return;
            }
            debug_assert!(self.scratch.len() <= self.buffer_size);

            let mut device = self.device.lock();
            let result = device
                .write_all(&self.scratch)
                .and_then(|_| device.port_mut().flush());
            if let Err(e) = result {
                error!("(worker): write of {} staged byte(s) failed: {}", n, e);
            }
        }
    }

    /// Service a read request in place: status, count and payload are
    /// filled in and the record becomes the response.
    pub fn route(&mut self, request: &mut Request) {
        match (self.framing, request.kind) {
            (Framing::Ascii, RequestKind::Line) => self.line(request),
            (Framing::Ascii, RequestKind::String) => {
                warn!("(worker): string reads are not supported, use line reads");
                request.invalidate(false);
            }
            (Framing::Ascii, RequestKind::Int) => {
                self.ascii_numbers(request, decode::scan_int, Payload::Ints)
            }
            (Framing::Ascii, RequestKind::Float) => {
                self.ascii_numbers(request, decode::scan_float, Payload::Floats)
            }
            (Framing::Binary, RequestKind::Byte) => self.binary_bytes(request),
            (Framing::Binary, RequestKind::Int) => self.binary_elements(request, INT_WIDTH, |b| {
                Payload::Ints(decode::decode_u32s(b))
            }),
            (Framing::Binary, RequestKind::Float) => {
                self.binary_elements(request, FLOAT_WIDTH, |b| {
                    Payload::Floats(decode::decode_f32s(b))
                })
            }
            (framing, kind) => {
                warn!("(worker): invalid request: {} read with {} framing", kind, framing);
                request.invalidate(true);
            }
        }
    }

    fn line_limit(&self) -> usize {
        self.buffer_size.saturating_sub(1).max(1)
    }

    fn line(&mut self, request: &mut Request) {
        let limit = self.line_limit();
        let result = codec::read_line(&mut *self.device.lock(), limit);
        match result {
            Ok(Some(line)) => request.succeed(1, Payload::Text(line)),
            Ok(None) => {
                debug!("(worker): line read found no input");
                request.fail();
            }
            Err(e) => {
                warn!("(worker): line read failed: {}", e);
                request.fail();
            }
        }
    }

    /// Parse up to `requested_count` numbers, stopping at the first that
    /// does not parse. Always a success, with however many were read.
    fn ascii_numbers<T>(
        &mut self,
        request: &mut Request,
        scan: fn(&mut codec::DeviceReader) -> Result<Option<T>, PortError>,
        wrap: fn(Vec<T>) -> Payload,
    ) {
        let mut values = Vec::new();
        {
            let mut device = self.device.lock();
            while values.len() < request.requested_count {
                match scan(&mut *device) {
                    Ok(Some(v)) => values.push(v),
                    Ok(None) => break,
                    Err(e) => {
                        warn!("(worker): {} read stopped: {}", request.kind, e);
                        break;
                    }
                }
            }
        }
        self.note_short_read(request, values.len());
        request.succeed(values.len(), wrap(values));
    }

    fn read_binary(&mut self, request: &Request, width: usize) -> Option<Vec<u8>> {
        let count = decode::clamp_count(request.requested_count, width, self.buffer_size);
        let result = decode::read_elements(&mut *self.device.lock(), width, count);
        match result {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("(worker): {} read failed: {}", request.kind, e);
                None
            }
        }
    }

    /// A single byte comes back as a scalar, anything else as a sequence.
    fn binary_bytes(&mut self, request: &mut Request) {
        let Some(bytes) = self.read_binary(request, BYTE_WIDTH) else {
            request.fail();
            return;
        };
        let actual = bytes.len();
        self.note_short_read(request, actual);
        let payload = match bytes.as_slice() {
            [b] => Payload::Byte(*b),
            _ => Payload::Bytes(bytes),
        };
        request.succeed(actual, payload);
    }

    fn binary_elements(&mut self, request: &mut Request, width: usize, wrap: fn(&[u8]) -> Payload) {
        let Some(bytes) = self.read_binary(request, width) else {
            request.fail();
            return;
        };
        let actual = bytes.len() / width;
        self.note_short_read(request, actual);
        request.succeed(actual, wrap(&bytes));
    }

    fn note_short_read(&self, request: &Request, actual: usize) {
        if actual < request.requested_count {
            SerialIoError::ShortRead {
                requested: request.requested_count,
                actual,
            }
            .log("worker");
        }
    }
}
