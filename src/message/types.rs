use crate::amf::Amf0Value;

/// Message type ids this engine recognizes (§6 wire protocol).
pub mod type_id {
    pub const SET_CHUNK_SIZE: u8 = 1;
    pub const ACKNOWLEDGEMENT: u8 = 3;
    pub const WINDOW_ACK_SIZE: u8 = 5;
    pub const SET_PEER_BANDWIDTH: u8 = 6;
    pub const AUDIO: u8 = 8;
    pub const VIDEO: u8 = 9;
    pub const AMF0_DATA: u8 = 18;
    pub const AMF0_COMMAND: u8 = 20;
    pub const MAX_KNOWN: u8 = 22;
}

/// A reassembled message before type-specific decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    pub type_id: u8,
    pub message_stream_id: u32,
    pub chunk_stream_id: u32,
    pub timestamp: u32,
    pub payload: Vec<u8>,
}

/// An AMF0 data message (`@setDataFrame onMetaData` and friends).
#[derive(Debug, Clone, PartialEq)]
pub struct Amf0Data {
    pub command_name: String,
    pub callback_name: String,
    pub parameters: Option<Amf0Value>,
    pub raw: Vec<u8>,
}

/// An AMF0 command message (`connect`, `publish`, `_result`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Amf0Command {
    pub name: String,
    pub transaction_id: i32,
    pub command_object: Option<Amf0Value>,
    pub extras: Vec<Amf0Value>,
}

impl Amf0Command {
    pub fn new(name: impl Into<String>, transaction_id: i32) -> Self {
        Amf0Command {
            name: name.into(),
            transaction_id,
            command_object: None,
            extras: Vec::new(),
        }
    }

    pub fn with_command_object(mut self, object: Amf0Value) -> Self {
        self.command_object = Some(object);
        self
    }

    pub fn with_extra(mut self, value: Amf0Value) -> Self {
        self.extras.push(value);
        self
    }
}

/// Tagged sum over the message variants the session controller handles, plus
/// the outbound-only, derived carrier `{chunk_stream_id, message_stream_id}`
/// fields each variant is framed with when re-encoded.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedMessage {
    SetChunkSize(u32),
    Acknowledgement(u32),
    AckWindowSize(u32),
    SetPeerBandwidth(u32, u8),
    Audio(Vec<u8>),
    Video(Vec<u8>),
    Amf0Data(Amf0Data),
    Amf0Command(Amf0Command),
}

/// Outbound chunk stream ids fixed by §4.5: control messages use 2, command
/// messages (and onStatus) use 3.
pub mod outbound_csid {
    pub const CONTROL: u32 = 2;
    pub const COMMAND: u32 = 3;
}

impl TypedMessage {
    pub fn type_id(&self) -> u8 {
        match self {
            TypedMessage::SetChunkSize(_) => type_id::SET_CHUNK_SIZE,
            TypedMessage::Acknowledgement(_) => type_id::ACKNOWLEDGEMENT,
            TypedMessage::AckWindowSize(_) => type_id::WINDOW_ACK_SIZE,
            TypedMessage::SetPeerBandwidth(_, _) => type_id::SET_PEER_BANDWIDTH,
            TypedMessage::Audio(_) => type_id::AUDIO,
            TypedMessage::Video(_) => type_id::VIDEO,
            TypedMessage::Amf0Data(_) => type_id::AMF0_DATA,
            TypedMessage::Amf0Command(_) => type_id::AMF0_COMMAND,
        }
    }
}
