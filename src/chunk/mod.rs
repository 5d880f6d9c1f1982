mod header;
mod reassembler;

pub use header::{apply_inheritance, read_header, ChunkHeader};
pub use reassembler::ChunkReassembler;
