mod client;
mod report;
mod session;
pub mod types;

pub use client::{AnalysisError, Analyzer, HttpAnalyzer, DEFAULT_BASE_URL};
pub use report::{percent, Summary};
pub use session::{Session, SessionError, Submission, View};
pub use types::{AnalysisKind, AnalysisRecord, AnalysisResult, DetectedObject, GlobalDiagnosis, Point};
