mod synthetic;

pub use synthetic::{SlipConfig, SyntheticChunkSource};
