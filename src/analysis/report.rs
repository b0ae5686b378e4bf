use super::types::{AnalysisRecord, AnalysisResult};
use std::fmt;

/// Plain-text rendering of a result, as printed by the CLI
pub struct Summary<'a>(pub &'a AnalysisRecord);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.result {
            AnalysisResult::Segmentation { objects } => {
                writeln!(f, "Detected objects: {}", objects.len())?;
                if objects.is_empty() {
                    writeln!(f, "No anomalies detected.")?;
                }
                for object in objects {
                    writeln!(f, "- {} ({}%)", object.label, percent(object.confidence))?;
                }
            }
            AnalysisResult::Classification { diagnosis } => {
                writeln!(f, "Diagnosis: {} ({}% confidence)", diagnosis.diagnosis, diagnosis.probability)?;
            }
        }

        if let Some(url) = &self.0.image_url {
            writeln!(f, "Stored at: {}", url)?;
        }
        Ok(())
    }
}

/// Confidence in 0..1 as a whole percentage
pub fn percent(confidence: f64) -> i64 {
    (confidence * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{DetectedObject, GlobalDiagnosis};

    #[test]
    fn lists_detected_objects() {
        let record: AnalysisRecord = AnalysisResult::Segmentation {
            objects: vec![
                DetectedObject {
                    label: "Ripe".to_string(),
                    confidence: 0.876,
                    polygon: vec![],
                },
                DetectedObject {
                    label: "Damaged".to_string(),
                    confidence: 0.5,
                    polygon: vec![],
                },
            ],
        }
        .into();

        assert_eq!(
            Summary(&record).to_string(),
            "Detected objects: 2\n- Ripe (88%)\n- Damaged (50%)\n"
        );
    }

    #[test]
    fn empty_segmentation_says_so() {
        let mut record: AnalysisRecord = AnalysisResult::Segmentation { objects: vec![] }.into();
        record.image_url = Some("temp://tomate.jpg".to_string());

        assert_eq!(
            Summary(&record).to_string(),
            "Detected objects: 0\nNo anomalies detected.\nStored at: temp://tomate.jpg\n"
        );
    }

    #[test]
    fn classification_keeps_literal_probability() {
        let record: AnalysisRecord = AnalysisResult::Classification {
            diagnosis: GlobalDiagnosis {
                diagnosis: "Unripe".to_string(),
                probability: 64.37,
            },
        }
        .into();

        assert_eq!(Summary(&record).to_string(), "Diagnosis: Unripe (64.37% confidence)\n");
    }
}
