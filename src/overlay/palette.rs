/// Stroke, fill and text colour for one detection label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelColors {
    pub stroke: &'static str,
    pub fill: &'static str,
    pub text: &'static str,
}

/// Used for any label the table does not know
pub const DEFAULT_COLORS: LabelColors = LabelColors {
    stroke: "yellow",
    fill: "rgba(255, 0, 0, 0.3)",
    text: "#ffffff",
};

const RIPE: LabelColors = LabelColors {
    stroke: "#ef4444",
    fill: "rgba(239, 68, 68, 0.3)",
    text: "#fee2e2",
};

const UNRIPE: LabelColors = LabelColors {
    stroke: "#22c55e",
    fill: "rgba(34, 197, 94, 0.3)",
    text: "#dcfce7",
};

const OLD: LabelColors = LabelColors {
    stroke: "#f59e0b",
    fill: "rgba(245, 158, 11, 0.3)",
    text: "#fef3c7",
};

const DAMAGED: LabelColors = LabelColors {
    stroke: "#a855f7",
    fill: "rgba(168, 85, 247, 0.3)",
    text: "#f3e8ff",
};

// Detector class names plus the Spanish names older models emit
const PALETTE: &[(&str, LabelColors)] = &[
    ("ripe", RIPE),
    ("maduro", RIPE),
    ("unripe", UNRIPE),
    ("verde", UNRIPE),
    ("old", OLD),
    ("viejo", OLD),
    ("damaged", DAMAGED),
    ("dañado", DAMAGED),
];

pub const HEALTHY_ACCENT: &str = "#4ade80";
pub const ALERT_ACCENT: &str = "#f87171";

/// Colours for a detection label, case-insensitive
pub fn colors_for(label: &str) -> LabelColors {
    let key = label.trim().to_lowercase();
    PALETTE
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, colors)| *colors)
        .unwrap_or(DEFAULT_COLORS)
}

/// Banner accent for a classification: green while the fruit is still unripe
pub fn diagnosis_accent(diagnosis: &str) -> &'static str {
    match diagnosis.trim().to_lowercase().as_str() {
        "verde" | "unripe" => HEALTHY_ACCENT,
        _ => ALERT_ACCENT,
    }
}
