use crate::utils::error::{ErrorPayload, ScoutError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// 指揮官名稱解析結果；`slug` 只由 `raw_name` 決定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommanderIdentity {
    pub raw_name: String,
    pub display_name: String,
    pub slug: String,
    /// "A // B" 的各面名稱 (已排除 "Back" 佔位)
    pub component_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    pub raw_input: String,
    /// 空字串代表 "all"
    pub canonical_segment: String,
    pub display_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryResult {
    pub source_url: String,
    pub canonical_slug: String,
    pub canonical_bracket: String,
    pub available_brackets: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardEntry {
    pub name: String,
    pub qty: u32,
    #[serde(default)]
    pub is_commander: bool,
}

impl CardEntry {
    pub fn new(name: impl Into<String>, qty: u32) -> Self {
        Self {
            name: name.into(),
            qty,
            is_commander: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommanderCard {
    pub name: String,
    pub qty: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEntry {
    pub name: String,
    pub deck_count: Option<u64>,
}

/// 頁面分區 (High Synergy Cards、Top Cards ...) 中的一張卡
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionCard {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synergy_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inclusion_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deck_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub potential_deck_count: Option<u64>,
}

impl SectionCard {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            synergy_percent: None,
            inclusion_percent: None,
            deck_count: None,
            potential_deck_count: None,
        }
    }
}

pub type Sections = BTreeMap<String, Vec<SectionCard>>;

pub const HIGH_SYNERGY_SECTION: &str = "High Synergy Cards";
pub const TOP_CARDS_SECTION: &str = "Top Cards";
pub const GAME_CHANGERS_SECTION: &str = "Game Changers";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckResult {
    pub commander_name: String,
    pub bracket: String,
    pub source_url: String,
    /// 不含指揮官本身
    pub cards: Vec<CardEntry>,
    pub commander_card: Option<CommanderCard>,
    pub tags: Vec<TagEntry>,
    pub sections: Sections,
    pub available_brackets: Vec<String>,
}

impl DeckResult {
    pub fn total_cards(&self) -> u32 {
        self.cards.iter().map(|c| c.qty).sum::<u32>()
            + self.commander_card.as_ref().map(|c| c.qty).unwrap_or(0)
    }

    pub fn section_names(&self, section: &str) -> Vec<String> {
        self.sections
            .get(section)
            .map(|cards| cards.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HydratedCard {
    pub name: String,
    pub qty: u32,
    pub external_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorIdentity {
    /// WUBRG 排序的字母，例如 "wur"
    pub code: String,
    pub label: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommanderSummary {
    pub commander_name: String,
    pub slug: String,
    pub budget: Option<String>,
    pub source_url: String,
    pub categories: Sections,
    pub tags: Vec<TagEntry>,
    pub top_tags: Vec<TagEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagTheme {
    pub tag: String,
    pub identity: Option<ColorIdentity>,
    pub commander: Option<String>,
    pub source_url: String,
    pub json_url: Option<String>,
    pub header: Option<String>,
    pub description: Option<String>,
    pub categories: Sections,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagIndexEntry {
    pub slug: String,
    pub name: String,
    pub identity: Option<String>,
    pub deck_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagIndex {
    pub source_url: String,
    pub tags: Vec<TagIndexEntry>,
}

// ---- 對外回應格式 ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseCard {
    pub name: String,
    pub qty: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEcho {
    pub name: String,
    pub bracket: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub source_url: Option<String>,
    pub resolved_bracket: Option<String>,
    pub request: RequestEcho,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commander: Option<String>,
    pub commander_tags: Vec<String>,
    pub commander_high_synergy_cards: Vec<String>,
    pub commander_top_cards: Vec<String>,
    pub commander_game_changers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_brackets: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageDeckResponse {
    pub cards: Vec<ResponseCard>,
    pub commander_card: Option<CommanderCard>,
    pub meta: ResponseMeta,
    pub error: Option<ErrorPayload>,
}

impl AverageDeckResponse {
    pub fn from_outcome(
        name: &str,
        bracket: Option<&str>,
        outcome: &std::result::Result<DeckResult, ScoutError>,
    ) -> Self {
        let request = RequestEcho {
            name: name.to_string(),
            bracket: bracket.map(str::to_string),
        };

        match outcome {
            Ok(deck) => Self {
                cards: deck
                    .cards
                    .iter()
                    .filter(|c| c.qty > 0 && !c.name.is_empty())
                    .map(|c| ResponseCard {
                        name: c.name.clone(),
                        qty: c.qty,
                    })
                    .collect(),
                commander_card: deck.commander_card.clone(),
                meta: ResponseMeta {
                    source_url: Some(deck.source_url.clone()),
                    resolved_bracket: Some(deck.bracket.clone()),
                    request,
                    commander: Some(deck.commander_name.clone()),
                    commander_tags: deck.tags.iter().map(|t| t.name.clone()).collect(),
                    commander_high_synergy_cards: deck.section_names(HIGH_SYNERGY_SECTION),
                    commander_top_cards: deck.section_names(TOP_CARDS_SECTION),
                    commander_game_changers: deck.section_names(GAME_CHANGERS_SECTION),
                    available_brackets: if deck.available_brackets.is_empty() {
                        None
                    } else {
                        Some(deck.available_brackets.clone())
                    },
                },
                error: None,
            },
            Err(e) => {
                let available_brackets = match e {
                    ScoutError::BracketUnavailable { available, .. } => Some(available.clone()),
                    _ => None,
                };
                Self {
                    cards: Vec::new(),
                    commander_card: None,
                    meta: ResponseMeta {
                        source_url: None,
                        resolved_bracket: None,
                        request,
                        commander: None,
                        commander_tags: Vec::new(),
                        commander_high_synergy_cards: Vec::new(),
                        commander_top_cards: Vec::new(),
                        commander_game_changers: Vec::new(),
                        available_brackets,
                    },
                    error: Some(e.to_payload()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_deck() -> DeckResult {
        let mut sections = Sections::new();
        sections.insert(
            TOP_CARDS_SECTION.to_string(),
            vec![SectionCard::named("Sol Ring"), SectionCard::named("Arcane Signet")],
        );
        DeckResult {
            commander_name: "Jodah, the Unifier".to_string(),
            bracket: "upgraded".to_string(),
            source_url: "https://edhrec.com/average-decks/jodah-the-unifier/upgraded".to_string(),
            cards: vec![CardEntry::new("Sol Ring", 1), CardEntry::new("Forest", 3)],
            commander_card: Some(CommanderCard {
                name: "Jodah, the Unifier".to_string(),
                qty: 1,
                components: None,
            }),
            tags: vec![TagEntry {
                name: "Legendary Matters".to_string(),
                deck_count: Some(1200),
            }],
            sections,
            available_brackets: vec!["all".to_string(), "upgraded".to_string()],
        }
    }

    #[test]
    fn test_total_cards_includes_commander() {
        assert_eq!(sample_deck().total_cards(), 5);
    }

    #[test]
    fn test_response_from_success() {
        let outcome = Ok(sample_deck());
        let response = AverageDeckResponse::from_outcome("Jodah, the Unifier", Some("upgraded"), &outcome);

        assert!(response.error.is_none());
        assert_eq!(response.cards.len(), 2);
        assert_eq!(response.meta.resolved_bracket.as_deref(), Some("upgraded"));
        assert_eq!(response.meta.commander_tags, vec!["Legendary Matters"]);
        assert_eq!(response.meta.commander_top_cards, vec!["Sol Ring", "Arcane Signet"]);
        assert!(response.meta.commander_game_changers.is_empty());

        let json = serde_json::to_value(&response).unwrap();
        assert!(json["commander_card"].get("components").is_none());
        assert_eq!(json["error"], serde_json::Value::Null);
    }

    #[test]
    fn test_response_from_bracket_unavailable() {
        let outcome = Err(ScoutError::BracketUnavailable {
            name: "Jodah, the Unifier".to_string(),
            bracket: "cedh".to_string(),
            available: vec!["all".to_string(), "upgraded".to_string()],
            commander_url: "https://edhrec.com/commanders/jodah-the-unifier".to_string(),
        });
        let response = AverageDeckResponse::from_outcome("Jodah, the Unifier", Some("cedh"), &outcome);

        assert!(response.cards.is_empty());
        assert!(response.commander_card.is_none());
        assert_eq!(
            response.meta.available_brackets,
            Some(vec!["all".to_string(), "upgraded".to_string()])
        );
        let error = response.error.unwrap();
        assert_eq!(error.url.as_deref(), Some("https://edhrec.com/commanders/jodah-the-unifier"));
    }
}
