pub mod config;
pub mod daily;
pub mod dates;
pub mod error;
pub mod export;
pub mod headers;
pub mod identity;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod range;
pub mod reduce;
pub mod report;
pub mod roster;
pub mod sources;
pub mod summary;
pub mod weekly;

pub use config::PipelineConfig;
pub use error::{ConsolidateError, Result};
pub use pipeline::{process, ProcessOutput, ReportInputs};
pub use range::DateRange;
