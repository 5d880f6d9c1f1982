use crate::amf::{decode_all, encode_values, Amf0Value};
use crate::amf::read_u32;
use crate::message::types::{outbound_csid, type_id, Amf0Command, Amf0Data, RawMessage, TypedMessage};
use crate::{Error, Result};

/// Decodes a reassembled raw message into a typed variant. Returns `Ok(None)`
/// for a message type the engine recognizes as valid RTMP but does not
/// implement (decoded as a "not implemented" condition the session controller
/// treats as skip-with-warning); returns `Err` for type ids the wire protocol
/// doesn't define at all (`>= 23`) or for malformed payloads of a known type.
pub fn decode(raw: &RawMessage) -> Result<Option<TypedMessage>> {
    if raw.type_id >= type_id::MAX_KNOWN + 1 {
        return Err(Error::framing(format!("msg type {} out of range", raw.type_id)));
    }
    match raw.type_id {
        type_id::SET_CHUNK_SIZE => Ok(Some(TypedMessage::SetChunkSize(decode_u32_body(&raw.payload)?))),
        type_id::ACKNOWLEDGEMENT => Ok(Some(TypedMessage::Acknowledgement(decode_u32_body(&raw.payload)?))),
        type_id::WINDOW_ACK_SIZE => Ok(Some(TypedMessage::AckWindowSize(decode_u32_body(&raw.payload)?))),
        type_id::SET_PEER_BANDWIDTH => Ok(Some(decode_set_peer_bandwidth(&raw.payload)?)),
        type_id::AUDIO => Ok(Some(TypedMessage::Audio(raw.payload.clone()))),
        type_id::VIDEO => Ok(Some(TypedMessage::Video(raw.payload.clone()))),
        type_id::AMF0_DATA => Ok(Some(TypedMessage::Amf0Data(decode_amf0_data(&raw.payload)?))),
        type_id::AMF0_COMMAND => Ok(Some(TypedMessage::Amf0Command(decode_amf0_command(&raw.payload)?))),
        _ => Ok(None),
    }
}

fn decode_u32_body(payload: &[u8]) -> Result<u32> {
    if payload.len() < 4 {
        return Err(Error::framing("control message payload too short"));
    }
    Ok(read_u32(&payload[0..4]))
}

fn decode_set_peer_bandwidth(payload: &[u8]) -> Result<TypedMessage> {
    if payload.len() < 5 {
        return Err(Error::framing("SetPeerBandwidth payload too short"));
    }
    Ok(TypedMessage::SetPeerBandwidth(read_u32(&payload[0..4]), payload[4]))
}

fn decode_amf0_data(payload: &[u8]) -> Result<Amf0Data> {
    let values = decode_all(payload)?;
    let command_name = values
        .first()
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let callback_name = values
        .get(1)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let parameters = values.get(2).cloned();
    Ok(Amf0Data {
        command_name,
        callback_name,
        parameters,
        raw: payload.to_vec(),
    })
}

fn decode_amf0_command(payload: &[u8]) -> Result<Amf0Command> {
    let values = decode_all(payload)?;
    if values.len() < 3 {
        return Err(Error::command(format!("invalid command message {:?}", values)));
    }
    let name = values[0]
        .as_str()
        .ok_or_else(|| Error::command("expected string as command name"))?
        .to_string();
    let transaction_id = values[1]
        .as_number()
        .ok_or_else(|| Error::command("expected number as transaction id"))? as i32;
    Ok(Amf0Command {
        name,
        transaction_id,
        command_object: Some(values[2].clone()),
        extras: values[3..].to_vec(),
    })
}

/// Converts a typed message back to its AMF0/raw payload bytes (no chunk
/// framing yet).
fn payload_of(msg: &TypedMessage) -> Result<Vec<u8>> {
    match msg {
        TypedMessage::SetChunkSize(n) => Ok(n.to_be_bytes().to_vec()),
        TypedMessage::Acknowledgement(n) => Ok(n.to_be_bytes().to_vec()),
        TypedMessage::AckWindowSize(n) => Ok(n.to_be_bytes().to_vec()),
        TypedMessage::SetPeerBandwidth(n, limit) => {
            let mut b = n.to_be_bytes().to_vec();
            b.push(*limit);
            Ok(b)
        }
        TypedMessage::Audio(bytes) | TypedMessage::Video(bytes) => Ok(bytes.clone()),
        TypedMessage::Amf0Data(_) => Err(Error::amf_encode("outbound Amf0Data is not produced by this engine")),
        TypedMessage::Amf0Command(cmd) => {
            let mut values = vec![Amf0Value::String(cmd.name.clone()), Amf0Value::Number(cmd.transaction_id as f64)];
            values.push(cmd.command_object.clone().unwrap_or(Amf0Value::Null));
            values.extend(cmd.extras.iter().cloned());
            encode_values(&values)
        }
    }
}

/// Picks the outbound csid and message stream id a typed reply is framed with.
/// Control messages (SetChunkSize/Acknowledgement/AckWindowSize/SetPeerBandwidth)
/// travel on csid 2, message stream 0; commands travel on csid 3.
/// `publish_stream_id` supplies the message stream id for an `onStatus` reply
/// carried on a particular published stream.
pub fn outbound_frame(msg: &TypedMessage, publish_stream_id: u32) -> (u32, u32) {
    match msg {
        TypedMessage::SetChunkSize(_)
        | TypedMessage::Acknowledgement(_)
        | TypedMessage::AckWindowSize(_)
        | TypedMessage::SetPeerBandwidth(_, _) => (outbound_csid::CONTROL, 0),
        TypedMessage::Amf0Command(cmd) if cmd.name == "onStatus" => (outbound_csid::COMMAND, publish_stream_id),
        _ => (outbound_csid::COMMAND, 0),
    }
}

/// Serializes one typed message into wire bytes: a fixed 12-byte format-0
/// header (outbound timestamps are always zero, per the reference's
/// simplification) followed by the payload, re-chunked at `chunk_size` with
/// format-3 continuation bytes.
///
/// `csid` must be `< 64` (outbound csid ≥ 64 is out of scope for the send path).
pub fn encode(chunk_size: usize, csid: u32, message_stream_id: u32, msg: &TypedMessage) -> Result<Vec<u8>> {
    if csid >= 64 {
        return Err(Error::framing(format!("chunk stream id {} not supported on send path", csid)));
    }
    let payload = payload_of(msg)?;

    let mut header = [0u8; 12];
    header[0] = csid as u8;
    // timestamp (bytes 1..4) left at zero; see outbound-timestamp design note
    let len = payload.len() as u32;
    header[4] = (len >> 16) as u8;
    header[5] = (len >> 8) as u8;
    header[6] = len as u8;
    header[7] = msg.type_id();
    header.get_mut(8..12).unwrap().copy_from_slice(&message_stream_id.to_le_bytes());

    let mut out = Vec::with_capacity(header.len() + payload.len() + payload.len() / chunk_size.max(1));
    out.extend_from_slice(&header);

    let mut offset = 0;
    while payload.len() - offset > chunk_size {
        out.extend_from_slice(&payload[offset..offset + chunk_size]);
        out.push(0xC0 | csid as u8);
        offset += chunk_size;
    }
    out.extend_from_slice(&payload[offset..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::types::type_id;

    #[test]
    fn decodes_set_chunk_size() {
        let raw = RawMessage {
            type_id: type_id::SET_CHUNK_SIZE,
            message_stream_id: 0,
            chunk_stream_id: 2,
            timestamp: 0,
            payload: 4096u32.to_be_bytes().to_vec(),
        };
        assert_eq!(decode(&raw).unwrap(), Some(TypedMessage::SetChunkSize(4096)));
    }

    #[test]
    fn unknown_type_under_23_is_none() {
        let raw = RawMessage {
            type_id: 2, // Abort, not implemented
            message_stream_id: 0,
            chunk_stream_id: 2,
            timestamp: 0,
            payload: vec![],
        };
        assert_eq!(decode(&raw).unwrap(), None);
    }

    #[test]
    fn type_id_23_or_above_errors() {
        let raw = RawMessage {
            type_id: 23,
            message_stream_id: 0,
            chunk_stream_id: 2,
            timestamp: 0,
            payload: vec![],
        };
        assert!(decode(&raw).is_err());
    }

    #[test]
    fn encode_splits_on_chunk_size_boundary() {
        let msg = TypedMessage::Audio(vec![0xAAu8; 10]);
        let bytes = encode(4, 8, 1, &msg).unwrap();
        // header(12) + 4 + continuation(1) + 4 + continuation(1) + 2
        assert_eq!(bytes.len(), 12 + 4 + 1 + 4 + 1 + 2);
        assert_eq!(bytes[12 + 4], 0xC0 | 8);
    }

    #[test]
    fn encode_audio_tag_matches_literal_scenario() {
        let msg = TypedMessage::Audio(vec![0xAA, 0xBB]);
        let bytes = encode(128, 4, 1, &msg).unwrap();
        assert_eq!(bytes[0], 4);
        assert_eq!(&bytes[4..7], &[0x00, 0x00, 0x02]); // length = 2
        assert_eq!(bytes[7], type_id::AUDIO);
        assert_eq!(&bytes[8..12], &1u32.to_le_bytes());
        assert_eq!(&bytes[12..], &[0xAA, 0xBB]);
    }

    #[test]
    fn rejects_csid_above_63_on_send() {
        let msg = TypedMessage::SetChunkSize(1);
        assert!(encode(128, 64, 0, &msg).is_err());
    }
}
