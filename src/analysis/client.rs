use super::types::{AnalysisKind, AnalysisRecord};
use crate::capture::CapturedImage;
use reqwest::blocking::{multipart, Client};
use serde::Deserialize;
use thiserror::Error;

/// Backend used when no base URL override is given
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("request to the analysis backend failed")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("backend sent an unreadable result")]
    Decode(#[from] serde_json::Error),
}

/// Trait for anything that can turn an image into an analysis
pub trait Analyzer {
    fn analyze(&self, image: &CapturedImage, kind: AnalysisKind) -> Result<AnalysisRecord, AnalysisError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Posts images to `{base_url}/analizar` as multipart form data
pub struct HttpAnalyzer {
    client: Client,
    endpoint: String,
}

impl HttpAnalyzer {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        let endpoint = format!("{}/analizar", base_url.trim_end_matches('/'));
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for HttpAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl Analyzer for HttpAnalyzer {
    fn analyze(&self, image: &CapturedImage, kind: AnalysisKind) -> Result<AnalysisRecord, AnalysisError> {
        let _span = tracing::debug_span!("analyze", kind = %kind).entered();

        let part = multipart::Part::bytes(image.bytes().to_vec())
            .file_name(image.file_name().to_string())
            .mime_str(image.mime())?;

        let form = multipart::Form::new()
            .part("imagen", part)
            .text("tipo_analisis", kind.as_form_value());

        tracing::info!("Submitting {} to {} ({})", image.file_name(), self.endpoint, kind);

        let response = self.client.post(&self.endpoint).multipart(form).send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|parsed| parsed.error)
                .unwrap_or(body);
            tracing::warn!("Backend rejected {}: {} {}", image.file_name(), status, message);
            return Err(AnalysisError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        let record: AnalysisRecord = serde_json::from_str(&body)?;
        tracing::debug!("Backend answered {} for {}", status, image.file_name());
        Ok(record)
    }
}
