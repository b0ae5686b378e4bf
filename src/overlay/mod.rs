mod palette;
pub mod svg;

pub use palette::{colors_for, diagnosis_accent, LabelColors, DEFAULT_COLORS};
pub use svg::{SvgDocument, SvgOverlay};

use crate::analysis::{percent, AnalysisResult, Point};

/// How far above a polygon's topmost vertex its label sits, in image pixels
pub const LABEL_OFFSET: f64 = 10.0;

/// Where to put a polygon's label
///
/// Horizontally centred on the mean vertex x, `LABEL_OFFSET` above the
/// topmost vertex. An empty polygon anchors at the origin.
pub fn label_anchor(polygon: &[Point]) -> Point {
    if polygon.is_empty() {
        return Point::ORIGIN;
    }

    let mean_x = polygon.iter().map(|p| p.x).sum::<f64>() / polygon.len() as f64;
    let top = polygon.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);

    Point::new(mean_x, top - LABEL_OFFSET)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub points: Vec<Point>,
    pub anchor: Point,
    pub caption: String,
    pub colors: LabelColors,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub title: String,
    pub subtitle: String,
    pub accent: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    /// One polygon and label per detected object
    Detections(Vec<Detection>),
    /// Full-frame diagnosis, no polygons
    Diagnosis(Banner),
}

/// Overlay scene in the image's natural pixel space
///
/// Backend polygons are already in source pixels, so the scene never
/// rescales them; the view box is the natural image size and whatever
/// displays the result reconciles it with the display size.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    width: u32,
    height: u32,
    layer: Layer,
}

impl Overlay {
    pub fn build(result: &AnalysisResult, (width, height): (u32, u32)) -> Self {
        let layer = match result {
            AnalysisResult::Segmentation { objects } => Layer::Detections(
                objects
                    .iter()
                    .map(|object| Detection {
                        points: object.polygon.clone(),
                        anchor: label_anchor(&object.polygon),
                        caption: format!("{} {}%", object.label, percent(object.confidence)),
                        colors: colors_for(&object.label),
                    })
                    .collect(),
            ),
            AnalysisResult::Classification { diagnosis } => Layer::Diagnosis(Banner {
                title: diagnosis.diagnosis.clone(),
                subtitle: format!("Confidence: {}%", diagnosis.probability),
                accent: diagnosis_accent(&diagnosis.diagnosis),
            }),
        };

        let overlay = Self {
            width,
            height,
            layer,
        };
        tracing::debug!("Overlay {}x{} with {} polygons", width, height, overlay.polygon_count());
        overlay
    }

    pub fn polygon_count(&self) -> usize {
        match &self.layer {
            Layer::Detections(detections) => detections.len(),
            Layer::Diagnosis(_) => 0,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn layer(&self) -> &Layer {
        &self.layer
    }

    pub fn view_box(&self) -> String {
        format!("0 0 {} {}", self.width, self.height)
    }

    /// Stroke width and font size grow with the image so labels stay legible
    fn scale(&self) -> f64 {
        (self.width.max(self.height) as f64 / 640.0).max(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{DetectedObject, GlobalDiagnosis};

    fn object(label: &str, confidence: f64, polygon: &[[f64; 2]]) -> DetectedObject {
        DetectedObject {
            label: label.to_string(),
            confidence,
            polygon: polygon.iter().copied().map(Point::from).collect(),
        }
    }

    #[test]
    fn anchor_is_mean_x_above_top_vertex() {
        let polygon: Vec<Point> = [[10.0, 50.0], [30.0, 20.0], [50.0, 80.0], [70.0, 40.0]]
            .into_iter()
            .map(Point::from)
            .collect();

        assert_eq!(label_anchor(&polygon), Point::new(40.0, 20.0 - LABEL_OFFSET));
    }

    #[test]
    fn single_vertex_anchor() {
        assert_eq!(label_anchor(&[Point::new(5.5, 3.0)]), Point::new(5.5, 3.0 - LABEL_OFFSET));
    }

    #[test]
    fn empty_polygon_anchors_at_origin() {
        assert_eq!(label_anchor(&[]), Point::ORIGIN);
    }

    #[test]
    fn segmentation_builds_one_detection_per_object() {
        let result = AnalysisResult::Segmentation {
            objects: vec![
                object("Ripe", 0.91, &[[0.0, 10.0], [20.0, 10.0], [10.0, 30.0]]),
                object("Mystery", 0.456, &[]),
            ],
        };

        let overlay = Overlay::build(&result, (1280, 720));
        assert_eq!(overlay.view_box(), "0 0 1280 720");

        let Layer::Detections(detections) = overlay.layer() else {
            panic!("expected detections");
        };
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].caption, "Ripe 91%");
        assert_eq!(detections[0].anchor, Point::new(10.0, 0.0));
        assert_eq!(detections[0].colors, colors_for("Ripe"));
        assert_eq!(detections[1].caption, "Mystery 46%");
        assert_eq!(detections[1].anchor, Point::ORIGIN);
        assert_eq!(detections[1].colors, DEFAULT_COLORS);
    }

    #[test]
    fn classification_builds_single_banner() {
        let result = AnalysisResult::Classification {
            diagnosis: GlobalDiagnosis {
                diagnosis: "Old".to_string(),
                probability: 87.5,
            },
        };

        let overlay = Overlay::build(&result, (640, 480));
        assert_eq!(
            overlay.layer(),
            &Layer::Diagnosis(Banner {
                title: "Old".to_string(),
                subtitle: "Confidence: 87.5%".to_string(),
                accent: palette::ALERT_ACCENT,
            })
        );
    }
}
