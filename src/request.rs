//! The record that crosses the thread boundary.
//!
//! A `Request` is built on the caller's thread, serviced by the worker, and
//! comes back through the response queue as the same record with its
//! status, count and payload filled in.

use std::fmt;

/// What a request asks the worker to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Re-tag for requests the worker could not interpret.
    None,
    Byte,
    Int,
    Float,
    String,
    Line,
    /// Flush the write-staging buffer to the device.
    Write,
}

impl RequestKind {
    /// Whether this kind may be submitted as a read.
    pub fn is_read(self) -> bool {
        !matches!(self, RequestKind::None | RequestKind::Write)
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestKind::None => "none",
            RequestKind::Byte => "byte",
            RequestKind::Int => "int",
            RequestKind::Float => "float",
            RequestKind::String => "string",
            RequestKind::Line => "line",
            RequestKind::Write => "write",
        };
        f.write_str(name)
    }
}

/// Lifecycle of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pending,
    Success,
    Failure,
    /// The worker could not service this (kind, framing) combination.
    Invalid,
}

/// Decoded data carried by a response. Moved out on retrieval.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    #[default]
    Empty,
    Byte(u8),
    Bytes(Vec<u8>),
    Ints(Vec<i64>),
    Floats(Vec<f64>),
    Text(String),
}

/// A queued read/write request, or its completed response.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub kind: RequestKind,
    pub requested_count: usize,
    pub actual_count: usize,
    pub payload: Payload,
    pub status: Status,
}

impl Request {
    /// A pending read of `count` items of `kind`.
    pub fn read(kind: RequestKind, count: usize) -> Self {
        Self {
            kind,
            requested_count: count,
            actual_count: 0,
            payload: Payload::Empty,
            status: Status::Pending,
        }
    }

    /// A flush trigger for the write-staging buffer.
    pub fn write_trigger() -> Self {
        Self::read(RequestKind::Write, 0)
    }

    pub(crate) fn succeed(&mut self, actual_count: usize, payload: Payload) {
        self.actual_count = actual_count;
        self.payload = payload;
        self.status = Status::Success;
    }

    pub(crate) fn fail(&mut self) {
        self.actual_count = 0;
        self.payload = Payload::Empty;
        self.status = Status::Failure;
    }

    /// Mark as not serviceable. `retag` also clears the kind, which is how
    /// unknown (framing, kind) combinations are reported.
    pub(crate) fn invalidate(&mut self, retag: bool) {
        if retag {
            self.kind = RequestKind::None;
        }
        self.actual_count = 0;
        self.payload = Payload::Empty;
        self.status = Status::Invalid;
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

/// Head-of-queue summary returned by `peek_response`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseInfo {
    pub kind: RequestKind,
    pub status: Status,
    pub requested_count: usize,
    pub actual_count: usize,
}

impl From<&Request> for ResponseInfo {
    fn from(r: &Request) -> Self {
        Self {
            kind: r.kind,
            status: r.status,
            requested_count: r.requested_count,
            actual_count: r.actual_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_request_starts_pending() {
        let r = Request::read(RequestKind::Int, 3);
        assert_eq!(r.status, Status::Pending);
        assert_eq!(r.requested_count, 3);
        assert_eq!(r.actual_count, 0);
        assert_eq!(r.payload, Payload::Empty);
    }

    #[test]
    fn test_invalidate_retags() {
        let mut r = Request::read(RequestKind::Byte, 2);
        r.invalidate(true);
        assert_eq!(r.kind, RequestKind::None);
        assert_eq!(r.status, Status::Invalid);

        let mut s = Request::read(RequestKind::String, 1);
        s.invalidate(false);
        assert_eq!(s.kind, RequestKind::String);
    }

    #[test]
    fn test_read_kinds() {
        assert!(RequestKind::Line.is_read());
        assert!(!RequestKind::Write.is_read());
        assert!(!RequestKind::None.is_read());
        assert_eq!(RequestKind::Float.to_string(), "float");
    }
}
