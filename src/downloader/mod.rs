// Download engine: plan construction, execution, stream post-processing

pub mod diagnostics;
pub mod dispatch;
pub mod errors;
pub mod executor;
pub mod format_selector;
pub mod models;
pub mod plan;
pub mod postprocess;
pub mod runner;
pub mod tools;
pub mod urls;

pub use dispatch::DispatchController;
pub use errors::DownloadError;
pub use executor::TaskExecutor;
pub use models::{DownloadMode, DownloadPlan, PlanOptions, QualityPreset, TaskResult};
pub use plan::build_plan;
pub use postprocess::StreamPostProcessor;
pub use runner::{ProcessRunner, SystemRunner};
pub use tools::{ToolKind, ToolManager};
pub use urls::collect_urls;
