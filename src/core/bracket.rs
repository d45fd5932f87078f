//! Average-deck bracket 正規化

use crate::domain::model::Bracket;
use crate::utils::error::{Result, ScoutError};
use regex::Regex;
use std::sync::OnceLock;

/// 可用的 average-decks 路徑區段，空字串為 "all"
pub const ALLOWED_SEGMENTS: [&str; 10] = [
    "",
    "exhibition",
    "exhibition/budget",
    "exhibition/expensive",
    "core",
    "upgraded",
    "optimized",
    "cedh",
    "cedh/budget",
    "cedh/expensive",
];

const ALIASES: [(&str, &str); 14] = [
    ("all", ""),
    ("average", ""),
    ("default", ""),
    ("precon", "exhibition"),
    ("1", "exhibition"),
    ("2", "core"),
    ("3", "upgraded"),
    ("4", "optimized"),
    ("5", "cedh"),
    ("exhibition-budget", "exhibition/budget"),
    ("exhibition-expensive", "exhibition/expensive"),
    ("cedh-budget", "cedh/budget"),
    ("cedh-expensive", "cedh/expensive"),
    ("competitive", "cedh"),
];

fn repeated_slash_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/+").expect("valid slash regex"))
}

pub fn display_label(segment: &str) -> String {
    if segment.is_empty() {
        "all".to_string()
    } else {
        segment.to_string()
    }
}

pub fn allowed_labels() -> Vec<String> {
    ALLOWED_SEGMENTS.iter().map(|s| display_label(s)).collect()
}

/// 正規化為 canonical segment；無法辨識時回傳 `BracketUnsupported`
pub fn normalize_segment(input: &str) -> Result<String> {
    let lowered = input.trim().to_lowercase().replace('\\', "/");
    let collapsed = repeated_slash_re().replace_all(&lowered, "/");
    let text = collapsed.trim_matches('/');

    let resolved = ALIASES
        .iter()
        .find(|(alias, _)| *alias == text)
        .map(|(_, segment)| *segment)
        .unwrap_or(text);

    if ALLOWED_SEGMENTS.contains(&resolved) {
        Ok(resolved.to_string())
    } else {
        Err(ScoutError::BracketUnsupported {
            bracket: input.to_string(),
            allowed: allowed_labels(),
        })
    }
}

/// 連結上的 bracket 路徑；不支援的回傳 None
pub fn coerce_segment(input: &str) -> Option<String> {
    normalize_segment(input).ok()
}

impl Bracket {
    pub fn parse(raw_input: &str) -> Result<Self> {
        let canonical_segment = normalize_segment(raw_input)?;
        Ok(Self {
            raw_input: raw_input.to_string(),
            display_label: display_label(&canonical_segment),
            canonical_segment,
        })
    }

    /// `None` 代表呼叫端沒有提供 bracket
    pub fn require(raw_input: Option<&str>) -> Result<Self> {
        match raw_input {
            Some(raw) => Self::parse(raw),
            None => Err(ScoutError::BracketRequired),
        }
    }

    pub fn is_all(&self) -> bool {
        self.canonical_segment.is_empty()
    }
}
