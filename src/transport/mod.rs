pub mod driver;
pub mod source;

pub use driver::{DriverOptions, TransportDriver};
pub use source::{ChunkSource, WavChunkSource, pack_word};
