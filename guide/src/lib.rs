//! Interface-bootstrap guide: turns captured frames into the next step the user should take.

mod types;
pub use types::*;
mod config;
pub use config::GuideConfig;

pub mod detect;
pub mod fusion;
pub mod instructions;
pub mod sampler;
pub mod workflow;
pub use workflow::{Evaluation, Phase, evaluate};

mod runtime;
pub use runtime::{FrameStats, GuideRuntime, Pipeline, RuntimeUpdate};
