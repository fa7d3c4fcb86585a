// Pipeline orchestration: the stages wired together in order.

pub mod discovery;

pub use discovery::{analyze_degrees, analyze_degrees_observed, run, run_observed, DegreeAnalysis, PipelineOutput};
