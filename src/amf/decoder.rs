use crate::amf::amf0::{markers, Amf0Object, Amf0Value};
use crate::{Error, Result};

/// Reads big-endian u32 from a 1..4 byte slice (3-byte form is RTMP/FLV's usual
/// timestamp/length encoding). Grounded on the original implementation's
/// `utils.ReadUint32`.
pub fn read_u32(b: &[u8]) -> u32 {
    match b.len() {
        1 => b[0] as u32,
        2 => (b[0] as u32) << 8 | b[1] as u32,
        3 => (b[0] as u32) << 16 | (b[1] as u32) << 8 | b[2] as u32,
        _ => u32::from_be_bytes([b[0], b[1], b[2], b[3]]),
    }
}

pub fn read_f64(b: &[u8]) -> Result<f64> {
    if b.len() != 8 {
        return Err(Error::amf_decode("data length not enough for number"));
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(b);
    Ok(f64::from_be_bytes(buf))
}

/// Decodes a sequence of self-delimiting AMF0 values until `data` is exhausted.
pub fn decode_all(data: &[u8]) -> Result<Vec<Amf0Value>> {
    let mut values = Vec::new();
    let mut i = 0;
    while i < data.len() {
        let (value, consumed) = decode_value(&data[i..])?;
        values.push(value);
        i += consumed;
    }
    Ok(values)
}

/// Decodes exactly one marked value, returning the value and bytes consumed.
pub fn decode_value(data: &[u8]) -> Result<(Amf0Value, usize)> {
    if data.is_empty() {
        return Err(Error::amf_decode("empty input"));
    }
    match data[0] {
        markers::NUMBER => decode_number(data),
        markers::BOOLEAN => decode_boolean(data),
        markers::STRING => decode_string(data),
        markers::OBJECT => decode_object(data),
        markers::NULL => Ok((Amf0Value::Null, 1)),
        markers::ECMA_ARRAY => decode_ecma_array(data),
        other => Err(Error::amf_decode(format!("AMF0 type {} is not supported", other))),
    }
}

fn decode_number(data: &[u8]) -> Result<(Amf0Value, usize)> {
    if data.len() < 9 {
        return Err(Error::amf_decode("data length not enough for number"));
    }
    Ok((Amf0Value::Number(read_f64(&data[1..9])?), 9))
}

fn decode_boolean(data: &[u8]) -> Result<(Amf0Value, usize)> {
    if data.len() < 2 {
        return Err(Error::amf_decode("invalid bool data"));
    }
    Ok((Amf0Value::Boolean(data[1] != 0), 2))
}

/// Decodes a string body (length + bytes) without the leading marker byte.
fn decode_string_body(data: &[u8]) -> Result<(String, usize)> {
    if data.len() < 2 {
        return Err(Error::amf_decode("data length not enough for string"));
    }
    let len = read_u32(&data[0..2]) as usize;
    if data.len() < 2 + len {
        return Err(Error::amf_decode("data length not enough for string"));
    }
    let s = String::from_utf8(data[2..2 + len].to_vec())
        .map_err(|e| Error::amf_decode(format!("invalid utf-8 in string: {}", e)))?;
    Ok((s, 2 + len))
}

fn decode_string(data: &[u8]) -> Result<(Amf0Value, usize)> {
    if data.is_empty() || data[0] != markers::STRING {
        return Err(Error::amf_decode("string marker mismatch"));
    }
    let (s, consumed) = decode_string_body(&data[1..])?;
    Ok((Amf0Value::String(s), consumed + 1))
}

/// Returns `Some(new_index)` if an object-end marker starts at `data[index..]`,
/// preferring the canonical 3-byte form and tolerating the bare 1-byte form.
fn object_end_at(data: &[u8], index: usize) -> Option<usize> {
    if index + 3 <= data.len()
        && data[index] == 0x00
        && data[index + 1] == 0x00
        && data[index + 2] == markers::OBJECT_END
    {
        return Some(index + 3);
    }
    if index < data.len() && data[index] == markers::OBJECT_END {
        return Some(index + 1);
    }
    None
}

/// Reads one `key: value` entry of an object body (no leading marker), returning
/// `(consumed, None)` when `data[0..]` is actually the object-end marker.
fn decode_entry(data: &[u8]) -> Result<(usize, Option<(String, Amf0Value)>)> {
    let (key, key_len) = decode_string_body(data)?;
    let mut i = key_len;
    if let Some(end) = object_end_at(data, i) {
        return Ok((end, None));
    }
    if i >= data.len() {
        return Err(Error::amf_decode("truncated object entry"));
    }
    let (value, value_len) = decode_value(&data[i..])?;
    i += value_len;
    Ok((i, Some((key, value))))
}

fn decode_object(data: &[u8]) -> Result<(Amf0Value, usize)> {
    if data.is_empty() || data[0] != markers::OBJECT {
        return Err(Error::amf_decode("object marker mismatch"));
    }
    let mut obj = Amf0Object::new();
    let mut i = 1;
    loop {
        if let Some(end) = object_end_at(data, i) {
            i = end;
            break;
        }
        let (consumed, entry) = decode_entry(&data[i..])?;
        i += consumed;
        if let Some((key, value)) = entry {
            obj.insert(key, value);
        } else {
            break;
        }
        if i >= data.len() {
            break;
        }
    }
    Ok((Amf0Value::Object(obj), i))
}

fn decode_ecma_array(data: &[u8]) -> Result<(Amf0Value, usize)> {
    if data.is_empty() || data[0] != markers::ECMA_ARRAY {
        return Err(Error::amf_decode("ecma marker mismatch"));
    }
    if data.len() < 5 {
        return Err(Error::amf_decode("data length not enough for ecma array"));
    }
    let count = read_u32(&data[1..5]);
    let mut obj = Amf0Object::new();
    let mut i = 5;
    for _ in 0..count {
        if i >= data.len() {
            return Err(Error::amf_decode("broken ecma data"));
        }
        if let Some(end) = object_end_at(data, i) {
            i = end;
            break;
        }
        let (consumed, entry) = decode_entry(&data[i..])?;
        i += consumed;
        if let Some((key, value)) = entry {
            obj.insert(key, value);
        } else {
            break;
        }
    }
    if let Some(end) = object_end_at(data, i) {
        i = end;
    }
    Ok((Amf0Value::EcmaArray(obj), i))
}
