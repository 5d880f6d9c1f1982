use std::io::Error as IoError;
use thiserror::Error;

/// Crate-wide error type. Every variant is terminal for the session that raised it;
/// RTMP publish sessions do not recover from a framing or semantic failure.
#[derive(Debug, Error)]
pub enum Error {
    #[error("framing error: {0}")]
    Framing(String),

    #[error("AMF0 decode error: {0}")]
    AmfDecode(String),

    #[error("AMF0 encode error: {0}")]
    AmfEncode(String),

    #[error("command error: {0}")]
    CommandShape(String),

    #[error("stream callback error: {0}")]
    Callback(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("transport error: {0}")]
    Transport(#[source] IoError),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("io error: {0}")]
    Io(#[from] IoError),
}

impl Error {
    pub fn framing(msg: impl Into<String>) -> Self {
        Error::Framing(msg.into())
    }

    pub fn amf_decode(msg: impl Into<String>) -> Self {
        Error::AmfDecode(msg.into())
    }

    pub fn amf_encode(msg: impl Into<String>) -> Self {
        Error::AmfEncode(msg.into())
    }

    pub fn command(msg: impl Into<String>) -> Self {
        Error::CommandShape(msg.into())
    }

    pub fn callback(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Callback(Box::new(err))
    }

    pub fn transport(err: IoError) -> Self {
        Error::Transport(err)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    /// True for errors the session controller should log at warning rather than
    /// error level on the way out (transport EOF is routine, not exceptional).
    pub fn is_eof(&self) -> bool {
        matches!(self, Error::Transport(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_variants() {
        assert_eq!(
            format!("{}", Error::framing("bad fmt")),
            "framing error: bad fmt"
        );
        assert_eq!(
            format!("{}", Error::command("missing name")),
            "command error: missing name"
        );
    }

    #[test]
    fn detects_eof() {
        let io = IoError::new(std::io::ErrorKind::UnexpectedEof, "eof");
        assert!(Error::transport(io).is_eof());
    }
}
