mod amf0;
mod decoder;
mod encoder;

pub use amf0::{markers, Amf0Object, Amf0Value};
pub use decoder::{decode_all, decode_value, read_f64, read_u32};
pub use encoder::{encode_value, encode_values};
