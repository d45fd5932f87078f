//! 指揮官名稱 → EDHREC slug
//!
//! 雙面卡與 Partner 以 `//` 分隔；`|` 之後是版本後綴，一律捨棄。

use crate::domain::model::CommanderIdentity;
use crate::utils::error::{Result, ScoutError};
use deunicode::deunicode;
use regex::Regex;
use std::sync::OnceLock;

const PLACEHOLDER_FACES: [&str; 2] = ["back", "backside"];

fn face_split_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*//\s*").expect("valid face split regex"))
}

fn suffix_split_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\|\s*").expect("valid suffix regex"))
}

fn non_alnum_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"))
}

fn strip_suffix(value: &str) -> &str {
    suffix_split_re().split(value).next().unwrap_or("").trim()
}

/// 單一名稱片段的 slug：轉 ASCII、小寫、去撇號、非英數轉連字號
pub fn slugify(value: &str) -> String {
    let folded = deunicode(&value.to_lowercase()).to_lowercase();
    let without_quotes: String = folded
        .chars()
        .filter(|c| !matches!(c, '\'' | '`' | '\u{2019}'))
        .collect();
    non_alnum_re()
        .replace_all(&without_quotes, "-")
        .trim_matches('-')
        .to_string()
}

/// 拆出各面名稱，丟掉 "Back"/"Backside" 佔位
pub fn split_faces(name: &str) -> Vec<String> {
    let raw = name.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    if !raw.contains("//") {
        return vec![strip_suffix(raw).to_string()];
    }

    let faces: Vec<String> = face_split_re()
        .split(raw)
        .map(strip_suffix)
        .filter(|face| !face.is_empty())
        .filter(|face| !PLACEHOLDER_FACES.contains(&face.to_lowercase().as_str()))
        .map(str::to_string)
        .collect();

    if faces.is_empty() {
        vec![strip_suffix(raw).to_string()]
    } else {
        faces
    }
}

/// slug 候選，最具體的在前：合併 slug，再來是只用第一面的 slug
pub fn slug_candidates(name: &str) -> Vec<String> {
    let faces = split_faces(name);
    let mut candidates = Vec::new();
    let Some(first) = faces.first() else {
        return candidates;
    };

    let combined = faces
        .iter()
        .map(|face| slugify(face))
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if !combined.is_empty() {
        candidates.push(combined);
    }

    let first_only = slugify(first);
    if !first_only.is_empty() && !candidates.contains(&first_only) {
        candidates.push(first_only);
    }

    candidates
}

pub fn commander_slug(name: &str) -> String {
    slug_candidates(name).into_iter().next().unwrap_or_default()
}

impl CommanderIdentity {
    pub fn resolve(raw_name: &str) -> Result<Self> {
        let faces = split_faces(raw_name);
        let slug = commander_slug(raw_name);
        if faces.is_empty() || slug.is_empty() {
            return Err(ScoutError::NameRequired);
        }

        Ok(Self {
            raw_name: raw_name.to_string(),
            display_name: faces.join(" // "),
            slug,
            component_names: faces,
        })
    }

    pub fn slug_candidates(&self) -> Vec<String> {
        slug_candidates(&self.raw_name)
    }

    pub fn is_multi_faced(&self) -> bool {
        self.component_names.len() > 1
    }
}
