pub mod generate;

pub use generate::{aligned_stream, chunked, slipped_stream, small_layout, word};
