//! Granular delay building blocks and the [`GrainEngine`] which combines them.

// -------------------------------------------------------------------------------------------------

mod engine;
mod mixer;
mod pool;
mod scheduler;
mod voice;
mod window;

// -------------------------------------------------------------------------------------------------

pub use engine::{
    GrainEngine, GrainParameters, DEFAULT_POOL_SIZE, DELAY_TIME_RANGE, GRAIN_SIZE_RANGE,
    MAX_DELAY_SECONDS,
};
pub use mixer::{FeedbackPath, MixLaw, PanLaw};
pub use pool::{GrainPool, GrainPosition, GrainSpawnParameters, VoiceAllocation};
pub use scheduler::GrainScheduler;
pub use voice::{GrainStart, GrainVoice};
pub use window::{hann, tukey, GrainWindow, WindowTable, HANN_WINDOW_TABLE_SIZE};

pub(crate) use window::HANN_WINDOW_TABLE;
