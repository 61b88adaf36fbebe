//! # MacBinary envelope detection and stripping.
//!
//! Classic Mac OS archives created by MacLHA prefix a member's decompressed
//! content with a 128 byte MacBinary header carrying Finder metadata (file
//! type, creator, fork lengths, ...). The `os_type` byte marks a member as
//! having possibly come from MacLHA, but does not say whether the header is
//! actually present, so its presence has to be inferred heuristically by
//! validating the header fields against the `.lzh` header itself.
use core::fmt;
use crate::error::LhaError;
use crate::header::LhaHeader;
use crate::decode::Decoder;

pub(crate) const MBHDR_SIZE: usize = 128;
/// Difference between the Macintosh 1904 epoch and the Unix 1970 epoch, in seconds.
const MAC_TIME_OFFSET: i64 = 2_082_844_800;

const MBHDR_OFF_VERSION: usize = 0x00;
const MBHDR_OFF_FILENAME_LEN: usize = 0x01;
const MBHDR_OFF_FILENAME: usize = 0x02;
const MBHDR_LEN_FILENAME: usize = 63;
const MBHDR_OFF_ZERO_COMPAT1: usize = 0x4a;
const MBHDR_OFF_ZERO_COMPAT2: usize = 0x52;
const MBHDR_OFF_DATA_FORK_LEN: usize = 0x53;
const MBHDR_OFF_RES_FORK_LEN: usize = 0x57;
const MBHDR_OFF_FILE_MOD_DATE: usize = 0x5f;
const MBHDR_OFF_COMMENT_LEN: usize = 0x63;
const MBHDR_OFF_MACBINARY2_DATA: usize = 0x65;

fn block_is_zero(data: &[u8]) -> bool {
    data.iter().all(|&b| b == 0)
}

fn read_be_u32(data: &[u8]) -> u32 {
    u32::from_be_bytes([data[0], data[1], data[2], data[3]])
}

/// The maximum UTC timezone offset is +14:00, observed in parts of the Pacific, which
/// is as far as a MacBinary-local modification time can legitimately drift from the
/// `.lzh` header's own timestamp.
fn modification_time_matches(mac_unix_secs: i64, lzh_unix_secs: Option<i64>) -> bool {
    match lzh_unix_secs {
        Some(ts) => (ts - mac_unix_secs).abs() <= 14 * 60 * 60,
        None => false
    }
}

/// Validates `data` (128 bytes) as a MacBinary header matching the enclosing member.
fn is_macbinary_header(data: &[u8; MBHDR_SIZE], filename: &[u8], original_size: u64, lzh_unix_secs: Option<i64>) -> bool {
    if data[MBHDR_OFF_VERSION] != 0
        || data[MBHDR_OFF_ZERO_COMPAT1] != 0
        || data[MBHDR_OFF_ZERO_COMPAT2] != 0
        || !block_is_zero(&data[MBHDR_OFF_COMMENT_LEN..MBHDR_OFF_COMMENT_LEN + 2])
        || !block_is_zero(&data[MBHDR_OFF_MACBINARY2_DATA..])
    {
        return false;
    }

    let filename_len = data[MBHDR_OFF_FILENAME_LEN] as usize;
    if filename_len > MBHDR_LEN_FILENAME
        || filename_len != filename.len()
        || &data[MBHDR_OFF_FILENAME..MBHDR_OFF_FILENAME + filename_len] != filename
        || !block_is_zero(&data[MBHDR_OFF_FILENAME + filename_len..MBHDR_OFF_FILENAME + MBHDR_LEN_FILENAME])
    {
        return false;
    }

    let data_fork_len = read_be_u32(&data[MBHDR_OFF_DATA_FORK_LEN..]) as u64;
    let res_fork_len = read_be_u32(&data[MBHDR_OFF_RES_FORK_LEN..]) as u64;
    let expected_len = data_fork_len + res_fork_len + MBHDR_SIZE as u64;
    if original_size != (expected_len + 0x7f) & !0x7f {
        return false;
    }

    let mod_time = read_be_u32(&data[MBHDR_OFF_FILE_MOD_DATE..]) as i64;
    mod_time >= MAC_TIME_OFFSET
        && modification_time_matches(mod_time - MAC_TIME_OFFSET, lzh_unix_secs)
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    /// The buffered header bytes turned out not to be a MacBinary header and are
    /// being replayed to the caller starting from `pos`.
    PrependHeader { pos: usize },
    /// Either the header was stripped, or no detection was attempted; serve `inner` directly.
    Passthrough,
}

/// Wraps a [Decoder] and strips a MacBinary II header from the front of its output
/// when one is detected, as documented at the top of this module.
///
/// On a mismatch the buffered 128 bytes are served to the caller as if no envelope
/// had ever been present, so the wrapping is transparent either way.
#[derive(Debug)]
pub struct MacBinaryDecoder<D> {
    inner: D,
    mode: Mode,
    header_buf: [u8; MBHDR_SIZE],
}

impl<D> MacBinaryDecoder<D> {
    /// Reads the member's leading 128 bytes from `inner` and, if they form a MacBinary
    /// II header matching `header`, reduces `header.original_size` down to the length
    /// of the enclosed fork and arranges for those bytes to be stripped from the
    /// decoder's output.
    ///
    /// On success returns the wrapping decoder, together with the leading bytes if
    /// they were stripped. The caller is responsible for still including those bytes
    /// in the member's checksum, since they remain part of the original content that
    /// was compressed and checksummed by the archiver.
    ///
    /// If `header.original_size` is smaller than a MacBinary header, no attempt at
    /// detection is made and `inner` is passed through verbatim.
    ///
    /// On an I/O error while reading the probe bytes, `inner` is handed back alongside
    /// the error so the caller can recover its underlying stream.
    pub fn new<R>(mut inner: D, header: &mut LhaHeader) -> Result<(Self, Option<[u8; MBHDR_SIZE]>), (D, LhaError<D::Error>)>
        where D: Decoder<R>, D::Error: fmt::Debug
    {
        if header.original_size < MBHDR_SIZE as u64 {
            return Ok((MacBinaryDecoder { inner, mode: Mode::Passthrough, header_buf: [0u8; MBHDR_SIZE] }, None));
        }

        let mut header_buf = [0u8; MBHDR_SIZE];
        if let Err(e) = inner.fill_buffer(&mut header_buf) {
            return Err((inner, e));
        }

        let lzh_unix_secs = header.parse_last_modified().to_utc().map(|dt| dt.timestamp());
        if is_macbinary_header(&header_buf, &header.filename, header.original_size, lzh_unix_secs) {
            let data_fork_len = read_be_u32(&header_buf[MBHDR_OFF_DATA_FORK_LEN..]) as u64;
            let res_fork_len = read_be_u32(&header_buf[MBHDR_OFF_RES_FORK_LEN..]) as u64;
            header.original_size = if data_fork_len > 0 { data_fork_len } else { res_fork_len };
            Ok((MacBinaryDecoder { inner, mode: Mode::Passthrough, header_buf }, Some(header_buf)))
        } else {
            log::warn!("macbinary envelope failed validation, treating member as plain data");
            Ok((MacBinaryDecoder { inner, mode: Mode::PrependHeader { pos: 0 }, header_buf }, None))
        }
    }
}

impl<R, D: Decoder<R>> Decoder<R> for MacBinaryDecoder<D> where D::Error: fmt::Debug {
    type Error = D::Error;

    fn into_inner(self) -> R {
        self.inner.into_inner()
    }

    fn fill_buffer(&mut self, buf: &mut[u8]) -> Result<(), LhaError<Self::Error>> {
        let mut target = buf;
        if let Mode::PrependHeader { pos } = self.mode {
            let remaining = &self.header_buf[pos..];
            let n = remaining.len().min(target.len());
            target[..n].copy_from_slice(&remaining[..n]);
            let new_pos = pos + n;
            self.mode = if new_pos < MBHDR_SIZE {
                Mode::PrependHeader { pos: new_pos }
            } else {
                Mode::Passthrough
            };
            target = &mut target[n..];
        }
        if !target.is_empty() {
            self.inner.fill_buffer(target)?;
        }
        Ok(())
    }
}
