mod amf;
mod chunk;
mod flv;
mod handshake;
mod logging;
mod message;
mod server;
mod session;
mod utils;

pub use amf::*;
pub use chunk::ChunkReassembler;
pub use flv::{tag_type, FLV_HEADER};
pub use handshake::Handshake;
pub use logging::{init as init_logging, LogLevel};
pub use message::*;
pub use server::{run, ServerConfig, ServerConfigBuilder};
pub use session::{Session, StreamEvent, StreamEventKind, StreamMeta};
pub use utils::{Error, Result};
