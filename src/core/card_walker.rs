//! 在任意形狀的 JSON 樹中尋找「像卡片」的陣列
//!
//! 上游 payload 沒有固定 schema；以鍵名啟發式辨識，並以 pattern matching 取值。

use crate::core::payload::page_props;
use crate::domain::model::CardEntry;
use crate::utils::error::{Result, ScoutError};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// 判斷元素是否像卡片時用的名稱鍵
const CARD_LIKE_NAME_KEYS: [&str; 5] = ["name", "cardName", "card_name", "cardname", "label"];
/// 正規化時取名稱的順序
const NAME_KEYS: [&str; 5] = ["name", "cardName", "card_name", "label", "title"];
const QTY_KEYS: [&str; 6] = ["qty", "quantity", "count", "copies", "amount", "q"];
const COMMANDER_FLAG_KEYS: [&str; 3] = ["isCommander", "is_commander", "commander"];
const CONTAINER_KEY_TOKENS: [&str; 5] = ["deck", "cards", "average", "mainboard", "board"];

fn non_blank_str(value: Option<&Value>) -> Option<&str> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim()),
        _ => None,
    }
}

fn is_card_like(item: &Value) -> bool {
    match item {
        Value::String(s) => !s.trim().is_empty(),
        Value::Object(obj) => {
            if let Some(Value::Object(card)) = obj.get("card") {
                if matches!(card.get("name"), Some(Value::String(_))) {
                    return true;
                }
            }
            if CARD_LIKE_NAME_KEYS
                .iter()
                .any(|key| matches!(obj.get(*key), Some(Value::String(_))))
            {
                return true;
            }
            matches!(obj.get("names"), Some(Value::Array(names)) if names.iter().all(Value::is_string))
        }
        _ => false,
    }
}

fn node_id(node: &Value) -> usize {
    node as *const Value as usize
}

/// 依發現順序串接所有像卡片的陣列；找不到回傳 None
///
/// 命中的陣列不再往內走，但兄弟節點繼續走 (不同分類可能分散在各處)。
pub fn deep_find_cards(root: &Value) -> Option<Vec<&Value>> {
    let mut hits: Vec<&Value> = Vec::new();
    let mut seen: HashSet<usize> = HashSet::new();
    let mut found_any = false;

    fn walk<'a>(node: &'a Value, hits: &mut Vec<&'a Value>, seen: &mut HashSet<usize>, found_any: &mut bool) {
        match node {
            Value::Array(items) => {
                if !seen.insert(node_id(node)) {
                    return;
                }
                if !items.is_empty() && items.iter().all(is_card_like) {
                    *found_any = true;
                    hits.extend(items.iter());
                    return;
                }
                for item in items {
                    walk(item, hits, seen, found_any);
                }
            }
            Value::Object(obj) => {
                for value in obj.values() {
                    walk(value, hits, seen, found_any);
                }
            }
            _ => {}
        }
    }

    walk(root, &mut hits, &mut seen, &mut found_any);
    found_any.then_some(hits)
}

/// 數量欄位：整數、浮點 (截斷) 或純數字字串；布林不算
pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
                trimmed.parse().ok()
            } else {
                None
            }
        }
        _ => None,
    }
}

fn resolve_name(source: &Map<String, Value>) -> Option<String> {
    if let Some(name) = NAME_KEYS.iter().find_map(|key| non_blank_str(source.get(*key))) {
        return Some(name.to_string());
    }

    if let Some(Value::Array(names)) = source.get("names") {
        let parts: Vec<&str> = names
            .iter()
            .filter_map(|v| non_blank_str(Some(v)))
            .collect();
        if !parts.is_empty() {
            return Some(parts.join(" // "));
        }
    }

    None
}

fn resolve_commander_flag(source: &Map<String, Value>) -> bool {
    let flagged = COMMANDER_FLAG_KEYS
        .iter()
        .any(|key| matches!(source.get(*key), Some(Value::Bool(true))));

    let in_category = match source.get("categories") {
        Some(Value::Array(categories)) => categories.iter().any(|cat| match cat {
            Value::String(s) => s.trim().eq_ignore_ascii_case("commander"),
            Value::Null => false,
            other => other.to_string().trim().eq_ignore_ascii_case("commander"),
        }),
        _ => false,
    };

    let role = non_blank_str(source.get("role")).or_else(|| non_blank_str(source.get("slot")));
    let by_role = role.is_some_and(|r| r.eq_ignore_ascii_case("commander"));

    flagged || in_category || by_role
}

/// 單一原始項目 → `CardEntry`
pub fn normalize_card_entry(entry: &Value) -> Option<CardEntry> {
    match entry {
        Value::String(s) => {
            let name = s.trim();
            (!name.is_empty()).then(|| CardEntry::new(name, 1))
        }
        Value::Object(obj) => {
            // 巢狀的 `card` 物件覆蓋外層欄位
            let merged;
            let source = match obj.get("card") {
                Some(Value::Object(card)) => {
                    let mut combined = obj.clone();
                    for (k, v) in card {
                        combined.insert(k.clone(), v.clone());
                    }
                    merged = combined;
                    &merged
                }
                _ => obj,
            };

            let name = resolve_name(source)?;
            let qty = QTY_KEYS
                .iter()
                .find_map(|key| source.get(*key).and_then(coerce_int))
                .unwrap_or(1);

            Some(CardEntry {
                name,
                qty: qty.clamp(1, u32::MAX as i64) as u32,
                is_commander: resolve_commander_flag(source),
            })
        }
        _ => None,
    }
}

/// 以名稱 (區分大小寫) 合併：數量相加、commander 旗標取 OR，保留首次出現順序
pub fn dedupe_cards(cards: impl IntoIterator<Item = CardEntry>) -> Vec<CardEntry> {
    let mut combined: Vec<CardEntry> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for card in cards {
        match index.get(&card.name) {
            Some(&i) => {
                let existing = &mut combined[i];
                existing.qty = existing.qty.saturating_add(card.qty);
                existing.is_commander |= card.is_commander;
            }
            None => {
                index.insert(card.name.clone(), combined.len());
                combined.push(card);
            }
        }
    }

    combined
}

fn normalize_all(root: &Value) -> Option<Vec<CardEntry>> {
    let raw = deep_find_cards(root)?;
    let normalized: Vec<CardEntry> = raw.into_iter().filter_map(normalize_card_entry).collect();
    (!normalized.is_empty()).then(|| dedupe_cards(normalized))
}

fn looks_like_card_container(key: &str) -> bool {
    let lowered = key.to_lowercase();
    CONTAINER_KEY_TOKENS.iter().any(|token| lowered.contains(token))
}

/// 從整個 payload 取出卡片清單
///
/// 先看 `pageProps` 中鍵名像牌組容器的欄位與 `pageData`，再退回整個 `pageProps`
/// 與整棵樹。什麼都找不到代表上游格式改變，回報 Parsing 並列出看到的鍵。
pub fn find_cards_in_payload(root: &Value, url: &str) -> Result<Vec<CardEntry>> {
    let props = page_props(root);

    if let Some(Value::Object(props_map)) = props {
        let mut candidates: Vec<&Value> = props_map
            .iter()
            .filter(|(key, _)| looks_like_card_container(key))
            .map(|(_, value)| value)
            .collect();
        if let Some(page_data) = props_map.get("pageData") {
            candidates.push(page_data);
        }

        for source in candidates {
            if let Some(cards) = normalize_all(source) {
                return Ok(cards);
            }
        }
    }

    let fallback = props.and_then(normalize_all).or_else(|| normalize_all(root));
    if let Some(cards) = fallback {
        return Ok(cards);
    }

    let keys_source = props.or(Some(root));
    let mut keys: Vec<&str> = match keys_source {
        Some(Value::Object(map)) => map.keys().map(String::as_str).collect(),
        _ => Vec::new(),
    };
    keys.sort_unstable();
    let keys = if keys.is_empty() {
        "(no keys)".to_string()
    } else {
        keys.join(", ")
    };

    Err(ScoutError::parsing(
        "Could not parse EDHREC average deck",
        url,
        Some(format!("pageProps keys: {}", keys)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_and_object_entries() {
        let tree = json!({
            "deck": [
                "Sol Ring",
                {"name": "Forest", "qty": 12},
                {"cardName": "Cultivate", "quantity": "2"},
                {"card": {"name": "Arcane Signet"}, "count": 1.0},
                {"names": ["Brazen Borrower", "Petty Theft"]}
            ]
        });

        let cards = normalize_all(&tree).unwrap();
        let names: Vec<&str> = cards.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Sol Ring", "Forest", "Cultivate", "Arcane Signet", "Brazen Borrower // Petty Theft"]
        );
        assert_eq!(cards[1].qty, 12);
        assert_eq!(cards[2].qty, 2);
        assert_eq!(cards[3].qty, 1);
    }

    #[test]
    fn test_duplicates_are_merged() {
        let tree = json!({
            "creatures": [{"name": "Sol Ring", "qty": 1}],
            "artifacts": [{"name": "Sol Ring", "qty": 1}, {"name": "Mind Stone"}]
        });

        let cards = normalize_all(&tree).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0], CardEntry::new("Sol Ring", 2));
    }

    #[test]
    fn test_merge_is_case_sensitive() {
        let merged = dedupe_cards(vec![CardEntry::new("Sol Ring", 1), CardEntry::new("sol ring", 1)]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_commander_flags() {
        let flagged = normalize_card_entry(&json!({"name": "Jodah", "isCommander": true})).unwrap();
        let by_category = normalize_card_entry(&json!({"name": "Jodah", "categories": ["Commander"]})).unwrap();
        let by_role = normalize_card_entry(&json!({"name": "Jodah", "slot": " commander "})).unwrap();
        let plain = normalize_card_entry(&json!({"name": "Jodah", "commander": "yes"})).unwrap();

        assert!(flagged.is_commander);
        assert!(by_category.is_commander);
        assert!(by_role.is_commander);
        assert!(!plain.is_commander);

        let merged = dedupe_cards(vec![plain, flagged]);
        assert!(merged[0].is_commander);
    }

    #[test]
    fn test_quantity_defaults_and_floor() {
        assert_eq!(normalize_card_entry(&json!({"name": "Island", "qty": 0})).unwrap().qty, 1);
        assert_eq!(normalize_card_entry(&json!({"name": "Island", "qty": true})).unwrap().qty, 1);
        assert_eq!(normalize_card_entry(&json!({"name": "Island", "qty": "x", "count": 3})).unwrap().qty, 3);
        assert!(normalize_card_entry(&json!({"id": 5})).is_none());
        assert!(normalize_card_entry(&json!("   ")).is_none());
    }

    #[test]
    fn test_mixed_arrays_are_descended() {
        let tree = json!({
            "sections": [
                {"header": "Lands", "cards": [{"name": "Command Tower"}]},
                {"header": "Ramp", "cards": [{"name": "Sol Ring"}]},
                42
            ]
        });
        let cards = normalize_all(&tree).unwrap();
        let names: Vec<&str> = cards.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Command Tower", "Sol Ring"]);
    }

    #[test]
    fn test_prefers_card_container_keys() {
        let root = json!({
            "props": {"pageProps": {
                "header": {"links": [{"label": "Home"}]},
                "deckList": [{"name": "Sol Ring", "qty": 1}]
            }}
        });
        let cards = find_cards_in_payload(&root, "https://edhrec.com/x").unwrap();
        assert_eq!(cards, vec![CardEntry::new("Sol Ring", 1)]);
    }

    #[test]
    fn test_no_cards_reports_keys() {
        let root = json!({"props": {"pageProps": {"title": "x", "meta": {"count": 3}}}});
        match find_cards_in_payload(&root, "https://edhrec.com/x") {
            Err(ScoutError::Parsing { details, .. }) => {
                assert_eq!(details.as_deref(), Some("pageProps keys: meta, title"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_empty_tree_reports_no_keys() {
        let err = find_cards_in_payload(&json!([]), "https://edhrec.com/x").unwrap_err();
        assert!(matches!(err, ScoutError::Parsing { details: Some(ref d), .. } if d == "pageProps keys: (no keys)"));
    }
}
