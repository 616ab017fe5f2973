pub mod channel;
pub mod control;
pub mod notify;
pub mod ring;
pub mod stats;
pub mod sync;

pub use channel::{CaptureChannel, ChannelState, IngestOutcome};
pub use control::StreamHandle;
pub use notify::{PeriodNotifier, PeriodWaker};
pub use ring::RingBufferWriter;
pub use stats::IngestStats;
pub use sync::{StreamSynchronizer, SyncOutcome};
