pub mod context;
pub mod supervisor;

pub use crate::domain::model::{BootPhase, RunSummary, StepReport, StepStatus};
pub use crate::domain::ports::{BootStep, CommandOutput, ConfigProvider, ProcessRunner};
pub use crate::utils::error::Result;
