use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A vertex in source-image pixel space
///
/// The backend sends polygons as arrays of `[x, y]` pairs, so a point
/// travels on the wire as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f64; 2] {
    fn from(point: Point) -> Self {
        [point.x, point.y]
    }
}

/// Which model the backend should run, sent as the `tipo_analisis` form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
pub enum AnalysisKind {
    /// Per-object polygons (YOLO segmentation)
    #[default]
    #[serde(rename = "segmentacion")]
    #[value(name = "segmentation", alias = "segmentacion")]
    Segmentation,

    /// One global diagnosis (EfficientNet classification)
    #[serde(rename = "clasificacion")]
    #[value(name = "classification", alias = "clasificacion")]
    Classification,
}

impl AnalysisKind {
    /// Value understood by the backend
    pub fn as_form_value(self) -> &'static str {
        match self {
            AnalysisKind::Segmentation => "segmentacion",
            AnalysisKind::Classification => "clasificacion",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_form_value())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    #[serde(rename = "objeto")]
    pub label: String,

    /// Detector confidence in 0..1
    #[serde(rename = "confianza")]
    pub confidence: f64,

    #[serde(rename = "poligono", default)]
    pub polygon: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalDiagnosis {
    #[serde(rename = "diagnostico")]
    pub diagnosis: String,

    /// Classifier probability in 0..100, already rounded by the backend
    #[serde(rename = "probabilidad")]
    pub probability: f64,
}

/// Backend result, discriminated by the `modo` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "modo")]
pub enum AnalysisResult {
    #[serde(rename = "segmentacion")]
    Segmentation {
        #[serde(rename = "objetos_detectados", default)]
        objects: Vec<DetectedObject>,
    },

    #[serde(rename = "clasificacion")]
    Classification {
        #[serde(rename = "analisis_global")]
        diagnosis: GlobalDiagnosis,
    },
}

impl AnalysisResult {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            AnalysisResult::Segmentation { .. } => AnalysisKind::Segmentation,
            AnalysisResult::Classification { .. } => AnalysisKind::Classification,
        }
    }
}

/// Full backend response: the result plus whatever bookkeeping the
/// backend attached when it stored the analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    #[serde(flatten)]
    pub result: AnalysisResult,

    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "nombre_archivo", default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    #[serde(rename = "url_imagen", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(rename = "fecha", default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<String>,
}

impl From<AnalysisResult> for AnalysisRecord {
    fn from(result: AnalysisResult) -> Self {
        Self {
            result,
            id: None,
            file_name: None,
            image_url: None,
            recorded_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_segmentation_response() {
        let body = r#"{
            "_id": "665f1c2e9b1e8a0012345678",
            "fecha": "Sat, 18 Oct 2026 10:00:00 GMT",
            "nombre_archivo": "tomate.jpg",
            "url_imagen": "https://bucket.s3.us-east-2.amazonaws.com/tomate.jpg",
            "modo": "segmentacion",
            "objetos_detectados": [
                {"objeto": "Ripe", "confianza": 0.91, "poligono": [[10.0, 20.0], [30, 40.5]]}
            ],
            "analisis_global": null
        }"#;

        let record: AnalysisRecord = serde_json::from_str(body).unwrap();
        assert_eq!(record.id.as_deref(), Some("665f1c2e9b1e8a0012345678"));
        assert_eq!(record.file_name.as_deref(), Some("tomate.jpg"));

        match record.result {
            AnalysisResult::Segmentation { objects } => {
                assert_eq!(objects.len(), 1);
                assert_eq!(objects[0].label, "Ripe");
                assert_eq!(objects[0].confidence, 0.91);
                assert_eq!(objects[0].polygon, vec![Point::new(10.0, 20.0), Point::new(30.0, 40.5)]);
            }
            other => panic!("expected segmentation, got {:?}", other),
        }
    }

    #[test]
    fn parses_classification_response() {
        let body = r#"{
            "modo": "clasificacion",
            "objetos_detectados": [],
            "analisis_global": {"diagnostico": "Unripe", "probabilidad": 87.25}
        }"#;

        let record: AnalysisRecord = serde_json::from_str(body).unwrap();
        assert_eq!(record.id, None);
        assert_eq!(
            record.result,
            AnalysisResult::Classification {
                diagnosis: GlobalDiagnosis {
                    diagnosis: "Unripe".to_string(),
                    probability: 87.25,
                }
            }
        );
        assert_eq!(record.result.kind(), AnalysisKind::Classification);
    }

    #[test]
    fn missing_lists_read_as_empty() {
        let record: AnalysisRecord = serde_json::from_str(r#"{"modo": "segmentacion"}"#).unwrap();
        assert_eq!(record.result, AnalysisResult::Segmentation { objects: vec![] });

        let object: DetectedObject =
            serde_json::from_str(r#"{"objeto": "Old", "confianza": 0.5}"#).unwrap();
        assert!(object.polygon.is_empty());
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let parsed = serde_json::from_str::<AnalysisRecord>(r#"{"modo": "deteccion"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn kind_form_values() {
        assert_eq!(AnalysisKind::default(), AnalysisKind::Segmentation);
        assert_eq!(AnalysisKind::Segmentation.as_form_value(), "segmentacion");
        assert_eq!(AnalysisKind::Classification.to_string(), "clasificacion");
    }
}
