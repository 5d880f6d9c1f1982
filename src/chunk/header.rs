use crate::amf::read_u32;
use crate::{Error, Result};

/// Message-header byte counts per chunk format (basic header excluded).
const MESSAGE_HEADER_SIZE: [usize; 4] = [11, 7, 3, 0];

const EXTENDED_TIMESTAMP_THRESHOLD: u32 = 0x00FF_FFFF;

/// A parsed chunk header after inheritance has been resolved against the
/// previous header on the same chunk stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub format: u8,
    pub chunk_stream_id: u32,
    pub timestamp: u32,
    pub timestamp_delta: u32,
    pub message_length: u32,
    pub type_id: u8,
    pub message_stream_id: u32,
}

impl ChunkHeader {
    fn empty() -> Self {
        ChunkHeader {
            format: 0xFF,
            chunk_stream_id: 0,
            timestamp: 0,
            timestamp_delta: 0,
            message_length: 0,
            type_id: 0,
            message_stream_id: 0,
        }
    }
}

/// Parses the basic header (1-3 bytes): high 2 bits format, low 6 bits csid code.
/// Returns `None` when more bytes are needed.
fn read_basic_header(data: &[u8]) -> Result<Option<(u8, u32, usize)>> {
    if data.is_empty() {
        return Ok(None);
    }
    let format = data[0] >> 6;
    let csid_code = data[0] & 0x3F;
    match csid_code {
        0x00 => {
            if data.len() < 2 {
                Ok(None)
            } else {
                Ok(Some((format, data[1] as u32 + 64, 2)))
            }
        }
        0x3F => {
            if data.len() < 3 {
                Ok(None)
            } else {
                let csid = data[2] as u32 * 256 + data[1] as u32;
                Ok(Some((format, csid, 3)))
            }
        }
        n => Ok(Some((format, n as u32, 1))),
    }
}

/// Reads the fixed part of a format-0/1/2 message header plus its extended
/// timestamp if present. `threshold_field` is whichever of timestamp/delta this
/// format carries. Returns consumed length, or `None` if incomplete.
fn read_message_header(format: u8, data: &[u8]) -> Result<Option<(ChunkHeader, usize)>> {
    let fixed_len = MESSAGE_HEADER_SIZE[format as usize];
    if data.len() < fixed_len {
        return Ok(None);
    }
    let mut h = ChunkHeader::empty();
    h.format = format;

    match format {
        0 => {
            h.timestamp = read_u32(&data[0..3]);
            h.message_length = read_u32(&data[3..6]);
            h.type_id = data[6];
            h.message_stream_id = u32::from_le_bytes([data[7], data[8], data[9], data[10]]);
        }
        1 => {
            h.timestamp_delta = read_u32(&data[0..3]);
            h.message_length = read_u32(&data[3..6]);
            h.type_id = data[6];
        }
        2 => {
            h.timestamp_delta = read_u32(&data[0..3]);
        }
        3 => {}
        _ => return Err(Error::framing("invalid chunk format")),
    }

    let extended_field = if format == 0 { h.timestamp } else { h.timestamp_delta };
    if format != 3 && extended_field >= EXTENDED_TIMESTAMP_THRESHOLD {
        if data.len() < fixed_len + 4 {
            return Ok(None);
        }
        let ext = read_u32(&data[fixed_len..fixed_len + 4]);
        if format == 0 {
            h.timestamp = ext;
        } else {
            h.timestamp_delta = ext;
        }
        return Ok(Some((h, fixed_len + 4)));
    }
    Ok(Some((h, fixed_len)))
}

/// Parses one chunk header (basic + message header + optional extended
/// timestamp). Returns `(header, consumed)`, or `consumed = 0` if `data` does not
/// yet hold a complete header.
pub fn read_header(data: &[u8]) -> Result<(ChunkHeader, usize)> {
    let (format, csid, basic_len) = match read_basic_header(data)? {
        Some(v) => v,
        None => return Ok((ChunkHeader::empty(), 0)),
    };
    if format > 3 {
        return Err(Error::framing("invalid fmt value"));
    }
    let (mut header, msg_len) = match read_message_header(format, &data[basic_len..])? {
        Some(v) => v,
        None => return Ok((ChunkHeader::empty(), 0)),
    };
    header.chunk_stream_id = csid;
    Ok((header, basic_len + msg_len))
}

/// Resolves format 1/2/3 inheritance against the previous header seen on this
/// chunk stream, mutating `curr` in place.
pub fn apply_inheritance(curr: &mut ChunkHeader, prev: Option<&ChunkHeader>) -> Result<()> {
    if curr.format == 0 {
        return Ok(());
    }
    let prev = prev.ok_or_else(|| Error::framing("first message on chunk stream is not fmt 0"))?;
    match curr.format {
        1 => {
            curr.message_stream_id = prev.message_stream_id;
            curr.timestamp = prev.timestamp.wrapping_add(curr.timestamp_delta);
        }
        2 => {
            curr.message_stream_id = prev.message_stream_id;
            curr.message_length = prev.message_length;
            curr.type_id = prev.type_id;
            curr.timestamp = prev.timestamp.wrapping_add(curr.timestamp_delta);
        }
        3 => {
            if curr.chunk_stream_id != prev.chunk_stream_id {
                return Err(Error::framing(format!(
                    "unexpected chunk stream id {}, expected {}",
                    curr.chunk_stream_id, prev.chunk_stream_id
                )));
            }
            curr.message_stream_id = prev.message_stream_id;
            curr.message_length = prev.message_length;
            curr.type_id = prev.type_id;
            curr.timestamp = prev.timestamp;
        }
        _ => unreachable!("format already validated to be 0..=3"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt0(csid: u8, ts: u32, len: u32, type_id: u8, stream_id: u32) -> Vec<u8> {
        let mut b = vec![csid];
        b.extend_from_slice(&ts.to_be_bytes()[1..]);
        b.extend_from_slice(&len.to_be_bytes()[1..]);
        b.push(type_id);
        b.extend_from_slice(&stream_id.to_le_bytes());
        b
    }

    #[test]
    fn parses_fmt0_header() {
        let data = fmt0(4, 0, 5, 18, 0);
        let (h, consumed) = read_header(&data).unwrap();
        assert_eq!(consumed, 12);
        assert_eq!(h.chunk_stream_id, 4);
        assert_eq!(h.message_length, 5);
        assert_eq!(h.type_id, 18);
    }

    #[test]
    fn incomplete_header_returns_zero() {
        let data = fmt0(4, 0, 5, 18, 0);
        let (_, consumed) = read_header(&data[..5]).unwrap();
        assert_eq!(consumed, 0);
    }

    #[test]
    fn two_byte_csid_form() {
        let mut data = vec![0x00, 0x0A]; // fmt 0, csid code 0 -> csid = 10 + 64
        data.extend_from_slice(&fmt0(0, 0, 1, 1, 0)[1..]);
        let (h, _) = read_header(&data).unwrap();
        assert_eq!(h.chunk_stream_id, 74);
    }

    #[test]
    fn fmt3_inherits_everything() {
        let prev = ChunkHeader {
            format: 0,
            chunk_stream_id: 4,
            timestamp: 100,
            timestamp_delta: 0,
            message_length: 10,
            type_id: 9,
            message_stream_id: 1,
        };
        let mut curr = ChunkHeader {
            format: 3,
            chunk_stream_id: 4,
            ..ChunkHeader::empty()
        };
        apply_inheritance(&mut curr, Some(&prev)).unwrap();
        assert_eq!(curr.timestamp, 100);
        assert_eq!(curr.message_length, 10);
        assert_eq!(curr.type_id, 9);
    }

    #[test]
    fn fmt3_csid_mismatch_errors() {
        let prev = ChunkHeader { chunk_stream_id: 4, ..ChunkHeader::empty() };
        let mut curr = ChunkHeader { format: 3, chunk_stream_id: 5, ..ChunkHeader::empty() };
        assert!(apply_inheritance(&mut curr, Some(&prev)).is_err());
    }

    #[test]
    fn nonzero_format_without_prev_errors() {
        let mut curr = ChunkHeader { format: 1, ..ChunkHeader::empty() };
        assert!(apply_inheritance(&mut curr, None).is_err());
    }

    #[test]
    fn extended_timestamp_threshold() {
        let mut data = fmt0(4, EXTENDED_TIMESTAMP_THRESHOLD, 5, 18, 0);
        data.extend_from_slice(&0x0100_0000u32.to_be_bytes());
        let (h, consumed) = read_header(&data).unwrap();
        assert_eq!(h.timestamp, 0x0100_0000);
        assert_eq!(consumed, 16);
    }
}
