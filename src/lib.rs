pub mod analysis;
pub mod config;
pub mod generator;
pub mod input;
pub mod models;
pub mod output;
pub mod session;
pub mod stats;

// Re-export commonly used types
pub use models::{EventId, LogBatch, LogRecord};
pub use analysis::{build_context, prepare, AnalysisRequest, Analyzer, AnalyzerError, GeminiAnalyzer};
pub use config::Config;
pub use generator::{generate, SyntheticLogGenerator};
pub use input::{normalize, SampleFetcher};
pub use output::{ExportReport, OutputFormat, OutputHandler};
pub use session::{ChatMessage, RequestToken, Session};
pub use stats::{aggregate, Stats, TimelineBucket};
