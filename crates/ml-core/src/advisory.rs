//! Static advisory table keyed by predicted class label
//!
//! Pure lookup data, not logic: four known labels plus a fixed fallback for
//! anything the model decodes that we do not recognize.

use crate::models::Advisory;

/// Advisory returned for any label not present in [`ADVISORIES`]
pub const UNKNOWN_ADVISORY: Advisory = Advisory {
    emoji: "\u{2753}",
    severity: "UNKNOWN",
    action: "Unknown state.",
    color: "#6b7280",
};

/// Known class labels and their operator guidance
pub const ADVISORIES: &[(&str, Advisory)] = &[
    (
        "Runaway",
        Advisory {
            emoji: "\u{1f6a8}",
            severity: "CRITICAL",
            action: "EMERGENCY: STOP CHARGING IMMEDIATELY. Isolate vehicle and evacuate area.",
            color: "#dc2626",
        },
    ),
    (
        "Alarm",
        Advisory {
            emoji: "\u{26a0}\u{fe0f}",
            severity: "HIGH",
            action: "Severe overheating detected. Check cooling systems and reduce charge rate.",
            color: "#ea580c",
        },
    ),
    (
        "Warning",
        Advisory {
            emoji: "\u{1f7e1}",
            severity: "MEDIUM",
            action: "Anomaly detected. Inspect for moisture, loose connections, or cell imbalance.",
            color: "#ca8a04",
        },
    ),
    (
        "Watch",
        Advisory {
            emoji: "\u{2705}",
            severity: "LOW",
            action: "System stable. Continue standard monitoring procedures.",
            color: "#16a34a",
        },
    ),
];

/// Look up the advisory for a predicted class label
pub fn advisory_for(label: &str) -> Advisory {
    ADVISORIES
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, advisory)| *advisory)
        .unwrap_or(UNKNOWN_ADVISORY)
}
