/// Per-message-stream metadata, populated incrementally from `connect`,
/// `publish`, and `@setDataFrame onMetaData`. A session may accumulate more
/// than one of these (one per RTMP message stream id that has published
/// something), stored in the order they were first seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamMeta {
    pub stream_id: u32,
    pub stream_name: String,
    pub url: String,
    pub has_video: bool,
    pub has_audio: bool,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub frame_rate: Option<i64>,
    pub video_codec: Option<String>,
    pub video_data_rate: Option<i64>,
    pub audio_codec: Option<String>,
    pub audio_data_rate: Option<i64>,
    pub audio_channels: Option<i64>,
    pub audio_sample_rate: Option<i64>,
    pub audio_sample_size: Option<i64>,
    pub stereo: Option<bool>,
    pub encoder: Option<String>,
}

impl StreamMeta {
    pub fn new(stream_id: u32) -> Self {
        StreamMeta {
            stream_id,
            ..Default::default()
        }
    }
}

/// The four kinds of bytes an embedder can receive; concatenated in the order
/// delivered, they form a valid FLV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEventKind {
    Header,
    Script,
    Audio,
    Video,
}

/// One callback delivery: FLV-formatted bytes for `meta`, plus the RTMP
/// timestamp that produced them (0 for `Header`/`Script`).
#[derive(Debug)]
pub struct StreamEvent<'a> {
    pub kind: StreamEventKind,
    pub timestamp: u32,
    pub bytes: &'a [u8],
}
