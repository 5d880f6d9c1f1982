mod codec;
mod types;

pub use codec::{decode, encode, outbound_frame};
pub use types::{outbound_csid, type_id, Amf0Command, Amf0Data, RawMessage, TypedMessage};
