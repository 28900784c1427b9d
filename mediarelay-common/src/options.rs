//! Normalisation of loosely typed generation options coming from clients.

const ASPECT_RATIOS: &[&str] = &[
    "auto", "1:1", "2:3", "3:2", "3:4", "4:3", "4:5", "5:4", "9:16", "16:9", "21:9",
];

/// Accepts ratios (`16:9`), named sizes (`landscape_16_9`) and loose spellings
/// (`16_9`, `16-9`). Anything unrecognised becomes `auto`.
pub fn normalize_aspect_ratio(raw: &str) -> &'static str {
    let s = raw.trim().to_ascii_lowercase();
    if s.is_empty() {
        return "auto";
    }
    if let Some(r) = ASPECT_RATIOS.iter().find(|r| **r == s) {
        return *r;
    }

    let named = match s.as_str() {
        "square" => Some("1:1"),
        "portrait_3_4" => Some("3:4"),
        "portrait_9_16" => Some("9:16"),
        "landscape_4_3" => Some("4:3"),
        "landscape_16_9" => Some("16:9"),
        _ => None,
    };
    if let Some(r) = named {
        return r;
    }

    let coerced = s.replacen(['_', '-'], ":", 1);
    ASPECT_RATIOS
        .iter()
        .find(|r| **r == coerced)
        .copied()
        .unwrap_or("auto")
}

pub fn normalize_resolution(raw: &str) -> &'static str {
    match raw.trim().to_ascii_lowercase().as_str() {
        "2k" | "2048" => "2K",
        "4k" => "4K",
        _ => "1K",
    }
}
