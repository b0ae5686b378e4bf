use super::{Banner, Detection, Layer, Overlay};
use crate::capture::CapturedImage;
use std::borrow::Cow;
use std::fmt::{self, Write};

const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// The overlay alone, meant to be stacked on top of the displayed image
pub struct SvgOverlay<'a>(pub &'a Overlay);

/// Standalone document: original image with the overlay on top
pub struct SvgDocument<'a> {
    pub overlay: &'a Overlay,
    pub image: &'a CapturedImage,
}

impl fmt::Display for SvgOverlay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            r#"<svg xmlns="{}" viewBox="{}" preserveAspectRatio="none">"#,
            SVG_NS,
            self.0.view_box()
        )?;
        write_layer(f, self.0)?;
        writeln!(f, "</svg>")
    }
}

impl fmt::Display for SvgDocument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (width, height) = self.overlay.dimensions();
        writeln!(
            f,
            r#"<svg xmlns="{}" width="{}" height="{}" viewBox="{}">"#,
            SVG_NS,
            width,
            height,
            self.overlay.view_box()
        )?;
        writeln!(
            f,
            r#"  <image href="{}" x="0" y="0" width="{}" height="{}"/>"#,
            self.image.preview_uri(),
            width,
            height
        )?;
        write_layer(f, self.overlay)?;
        writeln!(f, "</svg>")
    }
}

fn write_layer(out: &mut impl Write, overlay: &Overlay) -> fmt::Result {
    let scale = overlay.scale();
    match overlay.layer() {
        Layer::Detections(detections) => {
            writeln!(out, r#"  <g class="detections">"#)?;
            for detection in detections {
                write_detection(out, detection, scale)?;
            }
            writeln!(out, "  </g>")
        }
        Layer::Diagnosis(banner) => write_banner(out, banner, overlay.dimensions(), scale),
    }
}

fn write_detection(out: &mut impl Write, detection: &Detection, scale: f64) -> fmt::Result {
    let points = detection
        .points
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ");

    writeln!(
        out,
        r#"    <polygon points="{}" fill="{}" stroke="{}" stroke-width="{}"/>"#,
        points,
        detection.colors.fill,
        detection.colors.stroke,
        3.0 * scale
    )?;
    writeln!(
        out,
        r#"    <text x="{}" y="{}" fill="{}" stroke="{}" stroke-width="{}" paint-order="stroke" font-family="sans-serif" font-size="{}" font-weight="bold" text-anchor="middle">{}</text>"#,
        detection.anchor.x,
        detection.anchor.y,
        detection.colors.text,
        detection.colors.stroke,
        scale,
        16.0 * scale,
        escape(&detection.caption)
    )
}

fn write_banner(out: &mut impl Write, banner: &Banner, (width, height): (u32, u32), scale: f64) -> fmt::Result {
    let title_size = 24.0 * scale;
    let subtitle_size = 14.0 * scale;
    let padding = 15.0 * scale;
    let band = title_size + subtitle_size + 3.0 * padding;
    let top = height as f64 - band;
    let center = width as f64 / 2.0;

    writeln!(out, r#"  <g class="diagnosis">"#)?;
    writeln!(
        out,
        r#"    <rect x="0" y="{}" width="{}" height="{}" fill="rgba(0, 0, 0, 0.7)"/>"#,
        top, width, band
    )?;
    writeln!(
        out,
        r#"    <text x="{}" y="{}" fill="{}" font-family="sans-serif" font-size="{}" font-weight="bold" text-anchor="middle">{}</text>"#,
        center,
        top + padding + title_size,
        banner.accent,
        title_size,
        escape(&banner.title)
    )?;
    writeln!(
        out,
        r#"    <text x="{}" y="{}" fill="white" opacity="0.8" font-family="sans-serif" font-size="{}" text-anchor="middle">{}</text>"#,
        center,
        top + 2.0 * padding + title_size + subtitle_size,
        subtitle_size,
        escape(&banner.subtitle)
    )?;
    writeln!(out, "  </g>")
}

fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}
