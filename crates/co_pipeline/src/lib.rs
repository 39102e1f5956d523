pub mod logging;
pub mod manager;
pub mod publisher;
pub mod stage;

pub use logging::{init_logging, Logger};
pub use manager::{BatchReport, OptimizationManager};
pub use publisher::Publisher;
pub use stage::{AbortReason, PipelineOutcome, Stage};

pub mod prelude {
    pub use super::{OptimizationManager, PipelineOutcome, Stage};
    pub use co_core::{Error, Result};
}
