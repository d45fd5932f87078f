//! 頁面分區卡表 (High Synergy Cards、Top Cards、Game Changers 與 `cardlists`)

use crate::domain::model::{
    SectionCard, Sections, GAME_CHANGERS_SECTION, HIGH_SYNERGY_SECTION, TOP_CARDS_SECTION,
};
use serde_json::{Map, Value};
use std::collections::HashSet;

const SECTION_KEY_MAP: [(&str, &str); 7] = [
    ("highsynergy", HIGH_SYNERGY_SECTION),
    ("highsynergycards", HIGH_SYNERGY_SECTION),
    ("synergycards", HIGH_SYNERGY_SECTION),
    ("topcards", TOP_CARDS_SECTION),
    ("popularcards", TOP_CARDS_SECTION),
    ("gamechangers", GAME_CHANGERS_SECTION),
    ("gamechanger", GAME_CHANGERS_SECTION),
];

const SECTION_NAME_KEYS: [&str; 4] = ["name", "cardName", "label", "title"];

/// 鍵名只留小寫字母後對照分區標題
pub fn section_header_for_key(key: &str) -> Option<&'static str> {
    let normalized: String = key
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .collect();
    SECTION_KEY_MAP
        .iter()
        .find(|(k, _)| *k == normalized)
        .map(|(_, header)| *header)
}

fn clean_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn node_id(node: &Value) -> usize {
    node as *const Value as usize
}

fn entry_name(obj: &Map<String, Value>) -> Option<String> {
    let direct = SECTION_NAME_KEYS
        .iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_str))
        .map(clean_text)
        .find(|s| !s.is_empty());
    if direct.is_some() {
        return direct;
    }

    let parts: Vec<String> = obj
        .get("names")
        .and_then(Value::as_array)?
        .iter()
        .filter_map(Value::as_str)
        .map(clean_text)
        .filter(|s| !s.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join(" // "))
}

fn collect_names(node: &Value, seen: &mut HashSet<usize>, names: &mut Vec<String>) {
    if !seen.insert(node_id(node)) {
        return;
    }

    match node {
        Value::Object(obj) => {
            if let Some(name) = entry_name(obj) {
                names.push(name);
            }
            for (key, child) in obj {
                if SECTION_NAME_KEYS.contains(&key.as_str()) || key == "names" {
                    continue;
                }
                if child.is_object() || child.is_array() {
                    collect_names(child, seen, names);
                }
            }
        }
        Value::Array(items) => {
            let strings: Vec<String> = items
                .iter()
                .filter_map(Value::as_str)
                .map(clean_text)
                .filter(|s| !s.is_empty())
                .collect();
            if !strings.is_empty() && strings.len() == items.len() {
                names.extend(strings);
            } else {
                for item in items {
                    collect_names(item, seen, names);
                }
            }
        }
        _ => {}
    }
}

/// 分區底下所有卡名，不分大小寫去重
pub fn gather_section_card_names(source: &Value) -> Vec<String> {
    let mut names = Vec::new();
    collect_names(source, &mut HashSet::new(), &mut names);

    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(name.to_lowercase()))
        .collect()
}

fn append_unique(sections: &mut Sections, header: &str, cards: impl IntoIterator<Item = SectionCard>) {
    let existing = sections.entry(header.to_string()).or_default();
    let mut seen: HashSet<String> = existing.iter().map(|c| c.name.to_lowercase()).collect();
    for card in cards {
        if seen.insert(card.name.to_lowercase()) {
            existing.push(card);
        }
    }
    if existing.is_empty() {
        sections.remove(header);
    }
}

/// 依鍵名辨識的三個固定分區 (只有卡名)
pub fn sections_from_keys(root: &Value) -> Sections {
    let mut sections = Sections::new();
    let mut seen = HashSet::new();

    fn walk(node: &Value, seen: &mut HashSet<usize>, sections: &mut Sections) {
        if !seen.insert(node_id(node)) {
            return;
        }
        match node {
            Value::Object(obj) => {
                for (key, value) in obj {
                    if let Some(header) = section_header_for_key(key) {
                        let names = gather_section_card_names(value);
                        append_unique(sections, header, names.into_iter().map(SectionCard::named));
                    }
                    walk(value, seen, sections);
                }
            }
            Value::Array(items) => {
                for item in items {
                    walk(item, seen, sections);
                }
            }
            _ => {}
        }
    }

    walk(root, &mut seen, &mut sections);
    sections
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn as_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_u64(value: Option<&Value>) -> Option<u64> {
    as_f64(value).filter(|f| *f >= 0.0).map(|f| f as u64)
}

fn section_card(card: &Value) -> Option<SectionCard> {
    let obj = card.as_object()?;
    let name = entry_name(obj)?;

    let deck_count = as_u64(obj.get("num_decks").or_else(|| obj.get("numDecks")));
    let potential_deck_count = as_u64(obj.get("potential_decks").or_else(|| obj.get("potentialDecks")));
    let inclusion_percent = match (deck_count, potential_deck_count) {
        (Some(decks), Some(potential)) if potential > 0 => {
            Some(round2(decks as f64 / potential as f64 * 100.0))
        }
        _ => None,
    };

    Some(SectionCard {
        name,
        synergy_percent: as_f64(obj.get("synergy")).map(|s| round2(s * 100.0)),
        inclusion_percent,
        deck_count,
        potential_deck_count,
    })
}

/// `cardlists: [{header, cardviews|cards}]` → 各標題的卡表與統計
pub fn parse_cardlists(root: &Value) -> Sections {
    let mut sections = Sections::new();
    let mut seen = HashSet::new();

    fn walk(node: &Value, seen: &mut HashSet<usize>, sections: &mut Sections) {
        if !seen.insert(node_id(node)) {
            return;
        }
        match node {
            Value::Object(obj) => {
                for (key, value) in obj {
                    if key.eq_ignore_ascii_case("cardlists") {
                        if let Value::Array(lists) = value {
                            for list in lists {
                                read_cardlist(list, sections);
                            }
                            continue;
                        }
                    }
                    walk(value, seen, sections);
                }
            }
            Value::Array(items) => {
                for item in items {
                    walk(item, seen, sections);
                }
            }
            _ => {}
        }
    }

    walk(root, &mut seen, &mut sections);
    sections
}

fn read_cardlist(list: &Value, sections: &mut Sections) {
    let Some(obj) = list.as_object() else {
        return;
    };
    let header = ["header", "title", "tag"]
        .iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_str))
        .map(clean_text)
        .find(|s| !s.is_empty());
    let Some(header) = header else {
        return;
    };

    let cards = obj
        .get("cardviews")
        .or_else(|| obj.get("cards"))
        .and_then(Value::as_array);
    if let Some(cards) = cards {
        append_unique(sections, &header, cards.iter().filter_map(section_card));
    }
}

/// `cardlists` 為主，再補上依鍵名找到但尚未出現的卡名
pub fn extract_sections(root: &Value) -> Sections {
    let mut sections = parse_cardlists(root);
    for (header, cards) in sections_from_keys(root) {
        append_unique(&mut sections, &header, cards);
    }
    sections
}
