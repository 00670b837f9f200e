//! Blocking read/write path through `SerialIo` against a mock device.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use serial_io::{
    BaudRate, Framing, IntWidth, MockSerialPort, SerialIo, SerialIoError, StaticEnumerator,
    TransferMode, WriteValue,
};

#[test]
fn test_ascii_text_write_is_exact() {
    let mock = MockSerialPort::new("MOCK0");
    let mut io = open_mock(&mock, Framing::Ascii, TransferMode::Sync);

    assert!(io.write("42"));
    assert_eq!(mock.written(), vec![b'4', b'2']);
}

#[test]
fn test_ascii_number_writes() {
    let mock = MockSerialPort::new("MOCK0");
    let mut io = open_mock(&mock, Framing::Ascii, TransferMode::Sync);

    assert!(io.write_ints(&[1, -2, 3], 4));
    assert!(io.write(" "));
    assert!(io.write_floats(&[0.25, 10.0]));
    assert_eq!(mock.written(), b"1 -2 3 0.250000 10.000000".to_vec());
}

#[test]
fn test_binary_writes_follow_width() {
    let mock = MockSerialPort::new("MOCK0");
    let mut io = open_mock(&mock, Framing::Binary, TransferMode::Sync);

    assert!(io.write_int(-1, 1));
    assert!(io.write_int(0x01020304, 4));
    assert!(io.write(WriteValue::Bytes(vec![9, 9])));
    assert_eq!(
        mock.written(),
        vec![0xff, 0x04, 0x03, 0x02, 0x01, 0x09, 0x09]
    );

    assert!(matches!(
        io.try_write_int(5, 5),
        Err(SerialIoError::InvalidWriteWidth(5))
    ));
}

#[test]
fn test_sync_reads_round_trip_written_values() {
    // What one side writes in binary, the other reads back.
    let writer = MockSerialPort::new("TX");
    let mut tx = open_mock(&writer, Framing::Binary, TransferMode::Sync);
    assert!(tx.write_int(0xBEEF, 2));
    assert!(tx.write_float(-0.5));

    let reader = create_mock_port_with_input("RX", &writer.written());
    let rx = open_mock(&reader, Framing::Binary, TransferMode::Sync);
    assert_eq!(rx.read_int(IntWidth::Two), 0xBEEF);
    assert_eq!(rx.read_float(), -0.5);
}

#[test]
fn test_ascii_int_forms() {
    let mock = create_mock_port_with_input("MOCK0", b"  -12 0x10 017 +5x");
    let io = open_mock(&mock, Framing::Ascii, TransferMode::Sync);

    assert_eq!(io.read_int(IntWidth::Four), -12);
    assert_eq!(io.read_int(IntWidth::Four), 16);
    assert_eq!(io.read_int(IntWidth::Four), 15);
    assert_eq!(io.read_int(IntWidth::Four), 5);
    assert!(matches!(
        io.try_read_int(IntWidth::Four),
        Err(SerialIoError::DecodeFailure(_))
    ));
}

#[test]
fn test_soft_failures_never_panic() {
    let mock = create_mock_port_with_input("MOCK0", b"data\n");
    let mut io = open_mock(&mock, Framing::Binary, TransferMode::Async);

    assert_eq!(io.read_line(), None);
    assert!(io.set_mode(TransferMode::Sync));
    assert_eq!(io.read_line(), None);
    assert_eq!(io.read_string(), None);
    assert!(!io.write_int(1, 0));
    assert_eq!(mock.available_bytes(), 5);
}

#[test]
fn test_open_by_index_uses_enumerator_order() {
    let mut io = SerialIo::new().with_enumerator(StaticEnumerator::new(Vec::<String>::new()));
    assert!(!io.open(0, Framing::Ascii, BaudRate::B9600));
    assert!(matches!(
        io.try_open(0, Framing::Ascii, BaudRate::B9600),
        Err(SerialIoError::InvalidDevice { index: 0, available: 0 })
    ));
    assert!(!io.is_open());
}
