//! Shared test utilities for serial-io integration tests.
//!
//! - Opening a `SerialIo` over a mock device
//! - Waiting for the worker to produce responses

#![allow(dead_code)]

use serial_io::{EngineSettings, Framing, MockSerialPort, SerialIo, TransferMode};
use std::time::{Duration, Instant};

/// Upper bound on how long a test waits for the worker.
pub const WORKER_DEADLINE: Duration = Duration::from_secs(5);

/// Create a mock serial port with pre-programmed input.
pub fn create_mock_port_with_input(port_name: &str, input: &[u8]) -> MockSerialPort {
    let mock = MockSerialPort::new(port_name);
    mock.enqueue_read(input);
    mock
}

/// Open a `SerialIo` over `mock` with default settings.
pub fn open_mock(mock: &MockSerialPort, framing: Framing, mode: TransferMode) -> SerialIo {
    open_mock_with(mock, framing, mode, EngineSettings::default())
}

pub fn open_mock_with(
    mock: &MockSerialPort,
    framing: Framing,
    mode: TransferMode,
    settings: EngineSettings,
) -> SerialIo {
    let mut io = SerialIo::new().with_settings(settings);
    io.open_with_adapter(Box::new(mock.clone()), framing);
    assert!(io.set_mode(mode));
    io
}

/// Block until at least `n` responses are queued.
///
/// # Panics
/// If they do not arrive within [`WORKER_DEADLINE`].
pub fn wait_for_responses(io: &SerialIo, n: usize) {
    let deadline = Instant::now() + WORKER_DEADLINE;
    let mut seen = io.notifier().generation();
    while io.pending_responses() < n {
        let left = deadline.saturating_duration_since(Instant::now());
        assert!(
            !left.is_zero(),
            "timed out waiting for {n} responses, have {}",
            io.pending_responses()
        );
        if let Some(generation) = io.notifier().wait_timeout(seen, left.min(Duration::from_millis(50))) {
            seen = generation;
        }
    }
}

/// Poll `condition` until it holds or [`WORKER_DEADLINE`] passes.
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WORKER_DEADLINE;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    condition()
}
