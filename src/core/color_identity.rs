use crate::domain::model::ColorIdentity;
use crate::utils::error::{Result, ScoutError};

const WUBRG_ORDER: &str = "wubrg";

const SLUG_MAP: [(&str, &str); 31] = [
    ("w", "mono-white"),
    ("u", "mono-blue"),
    ("b", "mono-black"),
    ("r", "mono-red"),
    ("g", "mono-green"),
    ("wu", "azorius"),
    ("ub", "dimir"),
    ("br", "rakdos"),
    ("rg", "gruul"),
    ("wg", "selesnya"),
    ("wb", "orzhov"),
    ("ur", "izzet"),
    ("bg", "golgari"),
    ("wr", "boros"),
    ("ug", "simic"),
    ("wub", "esper"),
    ("ubr", "grixis"),
    ("brg", "jund"),
    ("wrg", "naya"),
    ("wug", "bant"),
    ("wbg", "abzan"),
    ("wur", "jeskai"),
    ("ubg", "sultai"),
    ("wbr", "mardu"),
    ("urg", "temur"),
    ("wubr", "yore-tiller"),
    ("ubrg", "glint-eye"),
    ("wbrg", "dune-brood"),
    ("wurg", "ink-treader"),
    ("wubg", "witch-maw"),
    ("wubrg", "five-color"),
];

/// 依 WUBRG 順序排列、去重，忽略其他字元
pub fn sort_wubrg(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    WUBRG_ORDER.chars().filter(|c| lowered.contains(*c)).collect()
}

fn title_case(slug: &str) -> String {
    slug.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// 接受字母 ("wur")、名稱 ("Jeskai"、"Mono White") 或 slug ("mono-green")
pub fn canonicalize_identity(value: &str) -> Result<ColorIdentity> {
    let s = value.trim().to_lowercase();
    if s.is_empty() {
        return Err(ScoutError::IdentityUnsupported {
            value: value.to_string(),
        });
    }

    let spaced = s.replace('-', " ");
    let by_name = SLUG_MAP
        .iter()
        .find(|(_, slug)| *slug == s || slug.replace('-', " ") == spaced)
        .map(|(code, _)| code.to_string());
    let code = by_name.unwrap_or_else(|| sort_wubrg(&s));

    match SLUG_MAP.iter().find(|(c, _)| *c == code) {
        Some((code, slug)) => Ok(ColorIdentity {
            code: code.to_string(),
            label: title_case(slug),
            slug: slug.to_string(),
        }),
        None => Err(ScoutError::IdentityUnsupported {
            value: value.to_string(),
        }),
    }
}
