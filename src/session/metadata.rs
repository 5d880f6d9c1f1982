//! `@setDataFrame onMetaData` handling (§4.7): updates the matching
//! `StreamMeta` and republishes the metadata as an FLV script tag.

use super::{Session, StreamEventKind};
use crate::amf::{decode_value, Amf0Object, Amf0Value};
use crate::message::Amf0Data;
use crate::Result;

impl Session {
    pub(super) fn handle_amf0_data(&mut self, data: &Amf0Data, message_stream_id: u32) -> Result<()> {
        if data.command_name != "@setDataFrame" {
            return Ok(());
        }
        if data.callback_name != "onMetaData" && data.callback_name != "onmetadata" {
            return Ok(());
        }

        let idx = self.stream_index(message_stream_id);
        if let Some(obj) = data.parameters.as_ref().and_then(|v| v.as_object()) {
            apply_metadata(&mut self.streams[idx], obj);
        }

        self.ensure_flv_header(idx)?;
        let script_payload = strip_leading_amf0_string(&data.raw);
        self.emit(idx, StreamEventKind::Script, 0, &crate::flv::script_tag(script_payload))
    }
}

fn apply_metadata(meta: &mut super::StreamMeta, obj: &Amf0Object) {
    let number_field = |key: &str| obj.get(key).and_then(|v| v.as_number()).map(|n| n as i64);
    let string_field = |key: &str| obj.get(key).and_then(|v| v.as_str()).map(str::to_string);
    let bool_field = |key: &str| obj.get(key).and_then(|v| v.as_bool());

    meta.width = number_field("width").or(meta.width);
    meta.height = number_field("height").or(meta.height);
    meta.frame_rate = number_field("framerate").or(meta.frame_rate);
    meta.video_data_rate = number_field("videodatarate").or(meta.video_data_rate);
    meta.audio_data_rate = number_field("audiodatarate").or(meta.audio_data_rate);
    meta.audio_sample_rate = number_field("audiosamplerate").or(meta.audio_sample_rate);
    meta.audio_sample_size = number_field("audiosamplesize").or(meta.audio_sample_size);
    meta.audio_channels = number_field("audiochannels").or(meta.audio_channels);
    meta.stereo = bool_field("stereo").or(meta.stereo);
    meta.encoder = string_field("encoder").or(meta.encoder.clone());

    if let Some(codec) = string_field("videocodecid") {
        meta.video_codec = Some(codec);
        meta.has_video = true;
    }
    if let Some(codec) = string_field("audiocodecid") {
        meta.audio_codec = Some(codec);
        meta.has_audio = true;
    }
    // `url` in the metadata object is informational; `meta.url` already
    // inherits `tcUrl` from `connect` at stream-creation time (§3).
}

/// Locates the script payload robustly: decodes the leading AMF0 string (the
/// `@setDataFrame` marker string itself) and returns everything after it,
/// rather than hard-coding its 16-byte encoded length (§9 open question).
fn strip_leading_amf0_string(raw: &[u8]) -> &[u8] {
    match decode_value(raw) {
        Ok((Amf0Value::String(_), consumed)) if consumed <= raw.len() => &raw[consumed..],
        _ => raw,
    }
}
