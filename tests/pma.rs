//! Integration test for the `-pm1-`/`-pm2-` (PMArc) decoder.
//!
//! No sample `.lzh` archive carrying a PMArc member was available to vendor as a
//! fixture, so this hand-assembles a minimal bitstream instead: a single-leaf code
//! tree (so every command always decodes to history offset `0`) means every emitted
//! byte is whatever currently sits at the head of the MRU history list, which starts
//! out as an ASCII space and never moves since touching the head with itself is a
//! no-op. That makes the expected output fully predictable without needing to trace
//! a real PMarc encoder's output by hand.
use std::io::{self, Cursor, Read as StdRead};
use lhacore::decode::DecoderAny;
use lhacore::header::{CompressionMethod, LhaHeader};
use lhacore::stub_io::Read as LhaRead;
use lhacore::LhaDecodeReader;

/// Discard bit, code tree with a single code (`num_codes = 1`, `min_code_length = 0`),
/// then five history-offset-0 reads (3 bits each) for five output bytes.
const BITSTREAM: [u8; 3] = [0x04, 0x00, 0x00];

fn crc16_arc(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &b in data {
        crc ^= b as u16;
        for _ in 0..8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ 0xA001 } else { crc >> 1 };
        }
    }
    crc
}

#[test]
fn decodes_repeated_history_head_byte() -> io::Result<()> {
    let expected = b"     "; // five spaces: the MRU history head byte, untouched
    assert_eq!(crc16_arc(expected), 0xd593);

    let decoder = DecoderAny::new_from_compression(
        CompressionMethod::Pm2,
        Cursor::new(BITSTREAM.to_vec()).take(BITSTREAM.len() as u64)
    );

    let mut header = LhaHeader::default();
    header.compression = *CompressionMethod::Pm2.as_identifier();
    header.compressed_size = BITSTREAM.len() as u64;
    header.original_size = expected.len() as u64;
    header.file_crc = crc16_arc(expected);

    let mut reader: LhaDecodeReader<Cursor<Vec<u8>>> = LhaDecodeReader::default();
    reader.begin_with_header_and_decoder(header, decoder);

    let mut out = Vec::new();
    reader.read_to_end(&mut out)?;
    assert_eq!(&out, expected);
    assert!(reader.crc_is_ok());
    assert_eq!(reader.crc_check().unwrap(), 0xd593);
    Ok(())
}

#[test]
fn progress_callback_fires_once_per_block_including_zero() -> io::Result<()> {
    let expected_len = 5u64;
    let decoder = DecoderAny::new_from_compression(
        CompressionMethod::Pm2,
        Cursor::new(BITSTREAM.to_vec()).take(BITSTREAM.len() as u64)
    );

    let mut header = LhaHeader::default();
    header.compression = *CompressionMethod::Pm2.as_identifier();
    header.compressed_size = BITSTREAM.len() as u64;
    header.original_size = expected_len;
    header.file_crc = crc16_arc(b"     ");

    let mut reader: LhaDecodeReader<Cursor<Vec<u8>>> = LhaDecodeReader::default();
    reader.begin_with_header_and_decoder(header, decoder);

    let calls = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let calls_in_callback = calls.clone();
    reader.set_progress_callback(move |done, total| {
        calls_in_callback.borrow_mut().push((done, total));
    });

    let mut out = [0u8; 5];
    reader.read_exact(&mut out)?;

    // A 5 byte file fits entirely within a single 4096 byte progress block, so the
    // callback should fire exactly twice: once at registration (block 0) and once
    // when the whole file has been consumed (block 1), never repeating a block.
    assert_eq!(&*calls.borrow(), &[(0, 1), (1, 1)]);
    Ok(())
}
