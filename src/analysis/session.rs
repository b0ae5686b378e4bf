use super::client::{AnalysisError, Analyzer};
use super::types::{AnalysisKind, AnalysisRecord};
use crate::capture::CapturedImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no image loaded")]
    NoImage,

    #[error("an analysis is already in flight")]
    Busy,

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// What the user should be looking at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Nothing loaded: show the upload/camera surface
    Capture,
    /// Image loaded, not yet analysed
    Ready,
    Loading,
    Result,
}

/// Request handed out by `Session::begin`
#[derive(Debug, Clone)]
pub struct Submission {
    pub image: CapturedImage,
    pub kind: AnalysisKind,
}

/// The single image/result pair being worked on
///
/// At most one request is in flight; the loading flag is cleared on every
/// completion, successful or not.
#[derive(Debug, Default)]
pub struct Session {
    kind: AnalysisKind,
    image: Option<CapturedImage>,
    result: Option<AnalysisRecord>,
    loading: bool,
}

impl Session {
    pub fn new(kind: AnalysisKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn kind(&self) -> AnalysisKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: AnalysisKind) {
        self.kind = kind;
    }

    pub fn image(&self) -> Option<&CapturedImage> {
        self.image.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisRecord> {
        self.result.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Replace the held image; any previous result no longer applies
    pub fn load_image(&mut self, image: CapturedImage) {
        tracing::debug!("Loaded {}", image.file_name());
        self.image = Some(image);
        self.result = None;
    }

    pub fn clear_image(&mut self) {
        self.image = None;
        self.result = None;
    }

    /// Back to an empty capture surface
    pub fn reset(&mut self) {
        tracing::debug!("Session reset");
        self.image = None;
        self.result = None;
    }

    pub fn view(&self) -> View {
        if self.loading {
            View::Loading
        } else if self.result.is_some() {
            View::Result
        } else if self.image.is_some() {
            View::Ready
        } else {
            View::Capture
        }
    }

    /// Mark a request as in flight
    pub fn begin(&mut self) -> Result<Submission, SessionError> {
        if self.loading {
            return Err(SessionError::Busy);
        }
        let image = self.image.clone().ok_or(SessionError::NoImage)?;

        self.loading = true;
        Ok(Submission {
            image,
            kind: self.kind,
        })
    }

    /// Finish the in-flight request; failures leave no result behind
    pub fn complete(
        &mut self,
        outcome: Result<AnalysisRecord, AnalysisError>,
    ) -> Result<&AnalysisRecord, SessionError> {
        self.loading = false;

        match outcome {
            Ok(record) => Ok(&*self.result.insert(record)),
            Err(err) => {
                tracing::error!("Analysis failed: {}", err);
                self.result = None;
                Err(err.into())
            }
        }
    }

    /// Run one analysis of the held image
    pub fn submit(&mut self, analyzer: &dyn Analyzer) -> Result<&AnalysisRecord, SessionError> {
        let submission = self.begin()?;
        let outcome = analyzer.analyze(&submission.image, submission.kind);
        self.complete(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisResult, GlobalDiagnosis};
    use crate::capture::sample_image;
    use std::cell::Cell;

    struct FakeAnalyzer {
        calls: Cell<usize>,
        fail: bool,
    }

    impl FakeAnalyzer {
        fn new(fail: bool) -> Self {
            Self {
                calls: Cell::new(0),
                fail,
            }
        }
    }

    impl Analyzer for FakeAnalyzer {
        fn analyze(&self, _image: &CapturedImage, kind: AnalysisKind) -> Result<AnalysisRecord, AnalysisError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(AnalysisError::Backend {
                    status: 500,
                    message: "Error procesando la imagen".to_string(),
                });
            }
            let result = match kind {
                AnalysisKind::Segmentation => AnalysisResult::Segmentation { objects: vec![] },
                AnalysisKind::Classification => AnalysisResult::Classification {
                    diagnosis: GlobalDiagnosis {
                        diagnosis: "Old".to_string(),
                        probability: 71.0,
                    },
                },
            };
            Ok(result.into())
        }
    }

    #[test]
    fn submit_stores_result_for_selected_kind() {
        let analyzer = FakeAnalyzer::new(false);
        let mut session = Session::default();
        assert_eq!(session.kind(), AnalysisKind::Segmentation);
        assert_eq!(session.view(), View::Capture);

        session.load_image(sample_image(4, 4));
        session.set_kind(AnalysisKind::Classification);
        assert_eq!(session.view(), View::Ready);

        let record = session.submit(&analyzer).unwrap();
        assert_eq!(record.result.kind(), AnalysisKind::Classification);
        assert_eq!(session.view(), View::Result);
        assert!(!session.is_loading());
    }

    #[test]
    fn submit_without_image_does_not_call_backend() {
        let analyzer = FakeAnalyzer::new(false);
        let mut session = Session::default();

        assert!(matches!(session.submit(&analyzer), Err(SessionError::NoImage)));
        assert_eq!(analyzer.calls.get(), 0);
        assert!(!session.is_loading());
    }

    #[test]
    fn second_begin_while_loading_is_busy() {
        let mut session = Session::default();
        session.load_image(sample_image(4, 4));

        let submission = session.begin().unwrap();
        assert_eq!(submission.kind, AnalysisKind::Segmentation);
        assert_eq!(session.view(), View::Loading);
        assert!(matches!(session.begin(), Err(SessionError::Busy)));

        session
            .complete(Ok(AnalysisResult::Segmentation { objects: vec![] }.into()))
            .unwrap();
        assert!(!session.is_loading());
    }

    #[test]
    fn failure_clears_loading_and_leaves_no_result() {
        let mut session = Session::default();
        session.load_image(sample_image(4, 4));
        session.submit(&FakeAnalyzer::new(false)).unwrap();

        let err = session.submit(&FakeAnalyzer::new(true)).unwrap_err();
        assert!(matches!(err, SessionError::Analysis(AnalysisError::Backend { status: 500, .. })));
        assert!(!session.is_loading());
        assert!(session.result().is_none());
        assert_eq!(session.view(), View::Ready);
    }

    #[test]
    fn reset_returns_to_capture_surface() {
        let mut session = Session::default();
        session.load_image(sample_image(4, 4));
        session.submit(&FakeAnalyzer::new(false)).unwrap();

        session.reset();
        assert!(session.image().is_none());
        assert!(session.result().is_none());
        assert_eq!(session.view(), View::Capture);
    }

    #[test]
    fn new_image_discards_old_result() {
        let mut session = Session::new(AnalysisKind::Classification);
        session.load_image(sample_image(4, 4));
        session.submit(&FakeAnalyzer::new(false)).unwrap();

        session.load_image(sample_image(6, 6));
        assert!(session.result().is_none());
        assert_eq!(session.image().map(|image| image.dimensions()), Some((6, 6)));

        session.clear_image();
        assert_eq!(session.view(), View::Capture);
    }
}
