mod commands;
mod metadata;
mod stream_meta;

pub use stream_meta::{StreamEvent, StreamEventKind, StreamMeta};

use crate::chunk::ChunkReassembler;
use crate::flv;
use crate::handshake::Handshake;
use crate::message::{decode, encode, outbound_frame, RawMessage, TypedMessage};
use crate::{Error, Result};

/// Default RTMP window acknowledgement size (§6).
pub const DEFAULT_WINDOW_SIZE: u32 = 2_500_000;

/// Outbound-only; this engine never renegotiates its own chunk size on the
/// send path (§1 Non-goals), so every outbound message is framed at 128.
const SEND_CHUNK_SIZE: usize = 128;

type DataCallback = Box<dyn FnMut(&StreamMeta, StreamEvent) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> + Send>;
type CloseCallback = Box<dyn FnMut(&StreamMeta, Option<&Error>) + Send>;

/// The per-connection RTMP protocol engine (§1-§6). Contains no I/O and no
/// `async fn`: a transport adapter drives it by repeatedly handing it bytes
/// and writing back whatever it returns. See `server::run_connection` for the
/// tokio-based adapter that owns the actual socket.
pub struct Session {
    handshake: Handshake,
    reassembler: ChunkReassembler,
    window_size: u32,
    received_since_ack: u32,
    create_stream_count: i32,
    streams: Vec<StreamMeta>,
    tc_url: Option<String>,
    swf_url: Option<String>,
    flash_ver: Option<String>,
    flv_header_emitted: bool,
    closed: bool,
    on_data: Option<DataCallback>,
    on_close: Option<CloseCallback>,
}

impl Session {
    pub fn new(
        on_data: impl FnMut(&StreamMeta, StreamEvent) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> + Send + 'static,
        on_close: impl FnMut(&StreamMeta, Option<&Error>) + Send + 'static,
    ) -> Self {
        Session::with_window_size(DEFAULT_WINDOW_SIZE, on_data, on_close)
    }

    pub fn with_window_size(
        window_size: u32,
        on_data: impl FnMut(&StreamMeta, StreamEvent) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> + Send + 'static,
        on_close: impl FnMut(&StreamMeta, Option<&Error>) + Send + 'static,
    ) -> Self {
        Session {
            handshake: Handshake::new(),
            reassembler: ChunkReassembler::new(),
            window_size,
            received_since_ack: 0,
            create_stream_count: 0,
            streams: Vec::new(),
            tc_url: None,
            swf_url: None,
            flash_ver: None,
            flv_header_emitted: false,
            closed: false,
            on_data: Some(Box::new(on_data)),
            on_close: Some(Box::new(on_close)),
        }
    }

    pub fn streams(&self) -> &[StreamMeta] {
        &self.streams
    }

    /// Feeds newly available transport bytes through the handshake and, once
    /// it completes, the chunk reassembler and session controller. Returns
    /// `(consumed, reply_bytes)`; the transport adapter drains `consumed`
    /// bytes from the front of its buffer and writes `reply_bytes` back to
    /// the socket before its next read. Any `Err` is terminal for the session.
    pub fn on_bytes(&mut self, buffer: &[u8]) -> Result<(usize, Vec<u8>)> {
        let mut consumed = 0;
        let mut reply = Vec::new();

        while !self.handshake.is_done() {
            let (hs_consumed, hs_reply) = self.handshake.on_bytes(&buffer[consumed..])?;
            reply.extend(hs_reply);
            if hs_consumed == 0 {
                return Ok((consumed, reply));
            }
            consumed += hs_consumed;
        }

        let mut pending_bytes = 0usize;
        loop {
            let (message, chunk_consumed) = self.reassembler.read(&buffer[consumed..])?;
            if chunk_consumed == 0 {
                break;
            }
            consumed += chunk_consumed;
            pending_bytes += chunk_consumed;

            if let Some(raw) = message {
                reply.extend(self.handle_raw_message(raw, pending_bytes)?);
                pending_bytes = 0;
            }
        }

        Ok((consumed, reply))
    }

    /// Invoked by the transport adapter on teardown (EOF, I/O error, idle
    /// timeout, or explicit close). Fires the close hook once per stream and
    /// is idempotent — a session already closed does nothing.
    pub fn on_close(&mut self, error: Option<&Error>) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Some(mut cb) = self.on_close.take() {
            for meta in &self.streams {
                cb(meta, error);
            }
            self.on_close = Some(cb);
        }
    }

    fn handle_raw_message(&mut self, raw: RawMessage, consumed_bytes: usize) -> Result<Vec<u8>> {
        let publish_stream_id = raw.message_stream_id;
        let typed = match decode(&raw)? {
            Some(t) => t,
            None => {
                log::warn!(
                    "unsupported message type {} on message stream {}, skipping",
                    raw.type_id,
                    raw.message_stream_id
                );
                let ack = self.account_received(consumed_bytes);
                return self.frame_all(ack.into_iter().collect::<Vec<_>>(), publish_stream_id);
            }
        };

        let mut outbound = Vec::new();
        match &typed {
            TypedMessage::SetChunkSize(n) => self.reassembler.set_chunk_size(*n),
            TypedMessage::AckWindowSize(n) => self.window_size = *n,
            TypedMessage::SetPeerBandwidth(_, _) => {}
            TypedMessage::Acknowledgement(_) => {}
            TypedMessage::Amf0Command(cmd) => {
                outbound.extend(self.handle_command(cmd, publish_stream_id)?);
            }
            TypedMessage::Amf0Data(data) => {
                self.handle_amf0_data(data, publish_stream_id)?;
            }
            TypedMessage::Audio(payload) => {
                self.emit_media(publish_stream_id, StreamEventKind::Audio, raw.timestamp, payload)?;
            }
            TypedMessage::Video(payload) => {
                self.emit_media(publish_stream_id, StreamEventKind::Video, raw.timestamp, payload)?;
            }
        }

        let mut messages = Vec::new();
        if let Some(ack) = self.account_received(consumed_bytes) {
            messages.push(ack);
        }
        messages.extend(outbound);
        self.frame_all(messages, publish_stream_id)
    }

    /// Bumps the received-byte counter and, once it reaches `window_size`,
    /// returns the `Acknowledgement` to prepend ahead of any other reply (§4.7).
    fn account_received(&mut self, n: usize) -> Option<TypedMessage> {
        self.received_since_ack = self.received_since_ack.saturating_add(n as u32);
        if self.received_since_ack >= self.window_size {
            let ack = TypedMessage::Acknowledgement(self.received_since_ack);
            self.received_since_ack = 0;
            Some(ack)
        } else {
            None
        }
    }

    fn frame_all(&self, messages: Vec<TypedMessage>, publish_stream_id: u32) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for msg in &messages {
            let (csid, message_stream_id) = outbound_frame(msg, publish_stream_id);
            out.extend(encode(SEND_CHUNK_SIZE, csid, message_stream_id, msg)?);
        }
        Ok(out)
    }

    /// Finds the `StreamMeta` for `stream_id`, creating one (inheriting
    /// `tc_url` as its `url`) if this is the first message seen on it.
    fn stream_index(&mut self, stream_id: u32) -> usize {
        if let Some(idx) = self.streams.iter().position(|s| s.stream_id == stream_id) {
            return idx;
        }
        let mut meta = StreamMeta::new(stream_id);
        meta.url = self.tc_url.clone().unwrap_or_default();
        self.streams.push(meta);
        self.streams.len() - 1
    }

    fn ensure_flv_header(&mut self, idx: usize) -> Result<()> {
        if !self.flv_header_emitted {
            self.flv_header_emitted = true;
            self.emit(idx, StreamEventKind::Header, 0, &flv::FLV_HEADER)?;
        }
        Ok(())
    }

    fn emit_media(&mut self, stream_id: u32, kind: StreamEventKind, timestamp: u32, payload: &[u8]) -> Result<()> {
        let idx = self.stream_index(stream_id);
        self.ensure_flv_header(idx)?;
        let tag = match kind {
            StreamEventKind::Audio => flv::audio_tag(timestamp, payload),
            StreamEventKind::Video => flv::video_tag(timestamp, payload),
            _ => unreachable!("emit_media only called for Audio/Video"),
        };
        self.emit(idx, kind, timestamp, &tag)
    }

    fn emit(&mut self, idx: usize, kind: StreamEventKind, timestamp: u32, bytes: &[u8]) -> Result<()> {
        if let Some(mut cb) = self.on_data.take() {
            let event = StreamEvent { kind, timestamp, bytes };
            let result = cb(&self.streams[idx], event);
            self.on_data = Some(cb);
            result.map_err(Error::callback)?;
        }
        Ok(())
    }
}
