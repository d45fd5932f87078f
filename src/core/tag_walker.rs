//! 指揮官主題 tag 擷取：HTML 連結與 JSON 樹兩條路徑，依名稱合併

use crate::core::payload::{page_props, RawPage};
use crate::domain::model::TagEntry;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

pub const MAX_TAG_LENGTH: usize = 64;

const STRUCTURAL_LABELS: [&str; 17] = [
    "themes",
    "kindred",
    "new cards",
    "high synergy",
    "high synergy cards",
    "top cards",
    "game changers",
    "card types",
    "creatures",
    "instants",
    "sorceries",
    "utility artifacts",
    "enchantments",
    "planeswalkers",
    "utility lands",
    "mana artifacts",
    "lands",
];

/// 其值視為 tag 本身的鍵
const TAG_CONTAINER_KEYS: [&str; 9] = [
    "tags", "themes", "items", "list", "entries", "values", "chips", "tag", "tagitem",
];
/// 只當作分組往下走、鍵名本身不是 tag 的鍵
const GROUPING_KEYS: [&str; 9] = [
    "sections", "groups", "tabgroups", "tabs", "taggroups", "collections", "edges", "nodes", "node",
];
const COUNT_CONTEXT_KEYS: [&str; 6] = ["tags", "themes", "tagcloud", "tag_cloud", "taggroups", "groups"];
const COUNT_KEYS: [&str; 6] = ["deckCount", "deck_count", "numDecks", "num_decks", "count", "decks"];
const COUNT_ATTRIBUTES: [&str; 3] = ["data-tag-count", "data-count", "data-deck-count"];

fn tag_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)/(?:tags|themes)/[a-z0-9\-]+(?:/[a-z0-9\-]+)?").expect("valid tag link regex")
    })
}

fn paren_count_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(([^)]+)\)\s*$").expect("valid count regex"))
}

fn trailing_count_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([0-9][0-9,\.]*\s*[kKmM]?)(?:\s+decks?|$)").expect("valid count regex"))
}

pub fn is_tag_link(href: &str) -> bool {
    tag_link_re().is_match(href)
}

fn clean_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// "1,234" / "1.2k" / "3M" → 牌組數
pub fn parse_count_text(text: &str) -> Option<u64> {
    let lowered = text.trim().to_lowercase().replace(',', "");
    if lowered.is_empty() {
        return None;
    }
    let (number, multiplier) = if let Some(rest) = lowered.strip_suffix('k') {
        (rest, 1_000.0)
    } else if let Some(rest) = lowered.strip_suffix('m') {
        (rest, 1_000_000.0)
    } else {
        (lowered.as_str(), 1.0)
    };

    let value = number.trim().parse::<f64>().ok()? * multiplier;
    (value.is_finite() && value >= 0.0).then(|| value as u64)
}

/// JSON 中的計數欄位；布林不算
pub fn parse_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => parse_count_text(s),
        _ => None,
    }
}

/// 拆開 "Tokens (1.2k)" 或 "Proliferate 1,234 decks" 這類文字
pub fn split_name_and_count(text: &str) -> (String, Option<u64>) {
    let cleaned = text.trim();
    if cleaned.is_empty() {
        return (String::new(), None);
    }

    if let Some(caps) = paren_count_re().captures(cleaned) {
        if let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) {
            let name = cleaned[..whole.start()].trim().to_string();
            return (name, parse_count_text(inner.as_str()));
        }
    }

    if let Some(caps) = trailing_count_re().captures(cleaned) {
        if let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) {
            if whole.end() == cleaned.len() {
                let name = cleaned[..whole.start()]
                    .trim_matches(|c| matches!(c, ' ' | '-' | ':' | '\u{2013}'))
                    .to_string();
                return (name, parse_count_text(number.as_str()));
            }
        }
    }

    (cleaned.to_string(), None)
}

/// 通過過濾條件的 tag 名稱；不合格回傳 None
pub fn normalize_tag_name(name: &str) -> Option<String> {
    let cleaned = clean_text(name);
    if cleaned.is_empty() || cleaned.chars().count() > MAX_TAG_LENGTH {
        return None;
    }
    if !cleaned.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if STRUCTURAL_LABELS.contains(&cleaned.to_lowercase().as_str()) {
        return None;
    }
    Some(cleaned)
}

/// 依名稱 (不分大小寫) 合併；先出現的非空計數保留
#[derive(Debug, Default)]
pub struct TagCollector {
    entries: Vec<TagEntry>,
    index: HashMap<String, usize>,
}

impl TagCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: &str, deck_count: Option<u64>) {
        let Some(normalized) = normalize_tag_name(name) else {
            return;
        };
        let key = normalized.to_lowercase();
        match self.index.get(&key) {
            Some(&i) => {
                let entry = &mut self.entries[i];
                if entry.deck_count.is_none() {
                    entry.deck_count = deck_count;
                }
            }
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(TagEntry {
                    name: normalized,
                    deck_count,
                });
            }
        }
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = TagEntry>) {
        for entry in entries {
            self.record(&entry.name, entry.deck_count);
        }
    }

    pub fn into_entries(self) -> Vec<TagEntry> {
        self.entries
    }
}

fn commander_node(root: &Value) -> Option<&Value> {
    page_props(root)
        .and_then(|props| props.get("commander"))
        .filter(|v| v.is_object())
}

fn collect_tag_names(source: &Value, treat_as_tag: bool, out: &mut Vec<String>) {
    match source {
        Value::String(s) => {
            if treat_as_tag {
                let cleaned = clean_text(s);
                if !cleaned.is_empty() {
                    out.push(cleaned);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_tag_names(item, treat_as_tag, out);
            }
        }
        Value::Object(obj) => {
            let mut nested: Vec<&Value> = Vec::new();
            if treat_as_tag {
                let name = ["name", "label", "title", "displayName", "theme"]
                    .iter()
                    .filter_map(|key| obj.get(*key).and_then(Value::as_str))
                    .map(clean_text)
                    .find(|s| !s.is_empty());
                match name {
                    Some(name) => out.push(name),
                    None => nested.extend(["tag", "theme"].iter().filter_map(|key| obj.get(*key))),
                }
            }

            for (key, value) in obj {
                let lowered = key.to_lowercase();
                if TAG_CONTAINER_KEYS.contains(&lowered.as_str()) {
                    nested.push(value);
                } else if GROUPING_KEYS.contains(&lowered.as_str()) {
                    collect_tag_names(value, false, out);
                }
            }

            for candidate in nested {
                collect_tag_names(candidate, true, out);
            }
        }
        _ => {}
    }
}

/// `commander.themes` 與 `metadata.tagCloud` 中的 tag 名稱 (無計數)
pub fn tag_names_from_json(root: &Value) -> Vec<String> {
    let Some(commander) = commander_node(root) else {
        return Vec::new();
    };

    let mut names = Vec::new();
    if let Some(themes) = commander.get("themes") {
        collect_tag_names(themes, true, &mut names);
    }
    if let Some(metadata) = commander.get("metadata") {
        let cloud = metadata
            .get("tagCloud")
            .filter(|v| !v.is_null())
            .or_else(|| metadata.get("tag_cloud"));
        if let Some(cloud) = cloud {
            collect_tag_names(cloud, false, &mut names);
        }
    }

    let mut collector = TagCollector::new();
    for name in &names {
        collector.record(name, None);
    }
    collector.into_entries().into_iter().map(|t| t.name).collect()
}

fn count_walk(node: &Value, in_tag_context: bool, seen: &mut HashSet<usize>, collector: &mut TagCollector) {
    if !seen.insert(node as *const Value as usize) {
        return;
    }

    match node {
        Value::Object(obj) => {
            let has_tag_link = ["slug", "href", "url", "path"]
                .iter()
                .filter_map(|key| obj.get(*key).and_then(Value::as_str))
                .any(is_tag_link);
            let tag_field = obj
                .get("tag")
                .filter(|v| is_truthy(v))
                .or_else(|| obj.get("theme").filter(|v| is_truthy(v)));

            let mut name = ["name", "label", "title", "displayName"]
                .iter()
                .filter_map(|key| obj.get(*key).and_then(Value::as_str))
                .map(str::trim)
                .find(|s| !s.is_empty())
                .map(str::to_string);
            if name.is_none() {
                name = match tag_field {
                    Some(Value::Object(tag)) => ["name", "label", "title"]
                        .iter()
                        .filter_map(|key| tag.get(*key).and_then(Value::as_str))
                        .map(str::trim)
                        .find(|s| !s.is_empty())
                        .map(str::to_string),
                    Some(Value::String(s)) => Some(s.trim().to_string()),
                    _ => None,
                };
            }

            let count = COUNT_KEYS.iter().find_map(|key| obj.get(*key).and_then(parse_count));
            let is_tag = in_tag_context || has_tag_link || tag_field.is_some();

            if let (Some(name), Some(count), true) = (name.as_deref(), count, is_tag) {
                if !name.is_empty() {
                    collector.record(name, Some(count));
                }
            }

            for (key, child) in obj {
                if child.is_object() || child.is_array() {
                    let child_context = is_tag || COUNT_CONTEXT_KEYS.contains(&key.to_lowercase().as_str());
                    count_walk(child, child_context, seen, collector);
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter().filter(|v| v.is_object() || v.is_array()) {
                count_walk(item, in_tag_context, seen, collector);
            }
        }
        _ => {}
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
    }
}

/// 指揮官 JSON 中附帶牌組數的 tag
pub fn tags_with_counts_from_json(root: &Value) -> Vec<TagEntry> {
    let mut collector = TagCollector::new();
    if let Some(commander) = commander_node(root) {
        let mut seen = HashSet::new();
        count_walk(commander, false, &mut seen, &mut collector);
    }
    collector.into_entries()
}

fn has_class_prefix(element: &ElementRef<'_>, prefix: &str) -> bool {
    element.value().classes().any(|class| class.starts_with(prefix))
}

fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// HTML 中連到 `/tags/...` 或 `/themes/...` 的 chip
pub fn tags_from_html(html: &str) -> Vec<TagEntry> {
    let mut collector = TagCollector::new();
    if html.trim().is_empty() {
        return collector.into_entries();
    }

    let (Some(div_sel), Some(anchor_sel), Some(span_sel), Some(child_sel)) = (
        selector("div[class]"),
        selector("a[href]"),
        selector("span[class]"),
        selector("span, div"),
    ) else {
        return collector.into_entries();
    };

    let document = Html::parse_document(html);

    // 新版側欄的 tag cloud
    let nav_panel = document
        .select(&div_sel)
        .find(|div| has_class_prefix(div, "NavigationPanel_tags__"));
    if let Some(panel) = nav_panel {
        for anchor in panel.select(&anchor_sel) {
            let href = anchor.value().attr("href").unwrap_or_default();
            if !is_tag_link(href) {
                continue;
            }

            let raw_name = anchor
                .select(&span_sel)
                .find(|span| has_class_prefix(span, "NavigationPanel_label__"))
                .map(|label| element_text(&label))
                .unwrap_or_else(|| element_text(&anchor));
            let (name, inline_count) = split_name_and_count(&raw_name);

            let badge_count = anchor
                .select(&span_sel)
                .find(|span| has_class_prefix(span, "badge") || has_class_prefix(span, "NavigationPanel_count__"))
                .and_then(|badge| parse_count_text(&element_text(&badge)));

            collector.record(&name, badge_count.or(inline_count));
        }
    }

    for anchor in document.select(&anchor_sel) {
        let href = anchor.value().attr("href").unwrap_or_default();
        if !is_tag_link(href) {
            continue;
        }

        let mut count = COUNT_ATTRIBUTES
            .iter()
            .filter_map(|attr| anchor.value().attr(attr))
            .find_map(parse_count_text);

        if count.is_none() {
            count = anchor
                .select(&child_sel)
                .find_map(|child| split_name_and_count(&element_text(&child)).1);
        }

        let (name, parsed_count) = split_name_and_count(&element_text(&anchor));
        collector.record(&name, count.or(parsed_count));
    }

    collector.into_entries()
}

/// 頁面上所有 tag：JSON 名稱、JSON 計數、HTML 依序合併
pub fn extract_tags(page: &RawPage) -> Vec<TagEntry> {
    let mut collector = TagCollector::new();

    if let Some(root) = &page.embedded_json {
        for name in tag_names_from_json(root) {
            collector.record(&name, None);
        }
        collector.extend(tags_with_counts_from_json(root));
    }
    collector.extend(tags_from_html(&page.html));

    collector.into_entries()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_count_parsing() {
        assert_eq!(parse_count_text("1,234"), Some(1234));
        assert_eq!(parse_count_text("1.2k"), Some(1200));
        assert_eq!(parse_count_text("3M"), Some(3_000_000));
        assert_eq!(parse_count_text("many"), None);
        assert_eq!(parse_count(&json!(true)), None);
        assert_eq!(parse_count(&json!(57)), Some(57));
    }

    #[test]
    fn test_split_name_and_count() {
        assert_eq!(split_name_and_count("Proliferate (1,234)"), ("Proliferate".to_string(), Some(1234)));
        assert_eq!(split_name_and_count("Proliferate 1.2k decks"), ("Proliferate".to_string(), Some(1200)));
        assert_eq!(split_name_and_count("Tokens - 512"), ("Tokens".to_string(), Some(512)));
        assert_eq!(split_name_and_count("+1/+1 Counters"), ("+1/+1 Counters".to_string(), None));
    }

    #[test]
    fn test_validity_filter() {
        assert!(normalize_tag_name("12345").is_none());
        assert!(normalize_tag_name(&"a".repeat(65)).is_none());
        assert!(normalize_tag_name("Themes").is_none());
        assert!(normalize_tag_name("kindred").is_none());
        assert_eq!(normalize_tag_name("  Legendary   Matters "), Some("Legendary Matters".to_string()));
    }

    #[test]
    fn test_collector_first_count_wins() {
        let mut collector = TagCollector::new();
        collector.record("Proliferate", None);
        collector.record("proliferate", Some(1234));
        collector.record("PROLIFERATE", Some(1));
        let entries = collector.into_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Proliferate");
        assert_eq!(entries[0].deck_count, Some(1234));
    }

    #[test]
    fn test_json_names_skip_structural_groups() {
        let root = json!({"props": {"pageProps": {"commander": {
            "themes": ["Legendary Matters", {"name": "Counters"}],
            "metadata": {"tagCloud": {"sections": [
                {"header": "Themes", "tags": [{"label": "Proliferate"}]},
                {"header": "Kindred", "items": [{"title": "Humans"}]}
            ]}}
        }}}});
        assert_eq!(
            tag_names_from_json(&root),
            vec!["Legendary Matters", "Counters", "Proliferate", "Humans"]
        );
    }

    #[test]
    fn test_json_counts_need_tag_context() {
        let root = json!({"props": {"pageProps": {"commander": {
            "cards": [{"name": "Sol Ring", "count": 9000}],
            "taglinks": [{"name": "Proliferate", "slug": "/tags/proliferate", "count": "1.2k"}],
            "tags": [{"label": "Tokens", "deckCount": 512}]
        }}}});
        let tags = tags_with_counts_from_json(&root);
        assert_eq!(
            tags,
            vec![
                TagEntry { name: "Proliferate".to_string(), deck_count: Some(1200) },
                TagEntry { name: "Tokens".to_string(), deck_count: Some(512) },
            ]
        );
    }

    #[test]
    fn test_html_navigation_panel() {
        let html = r#"
        <div class="NavigationPanel_tags__x1">
          <a class="LinkHelper_container__a" href="/tags/proliferate/atraxa-praetors-voice">
            <span class="NavigationPanel_label__q">Proliferate</span>
            <span class="badge bg-secondary">1,234</span>
          </a>
          <a href="/commanders/atraxa">Not a tag</a>
        </div>
        <a href="/themes/superfriends" data-count="1.2k">Superfriends</a>
        <a href="/tags/themes">Themes</a>
        "#;
        let tags = tags_from_html(html);
        assert_eq!(
            tags,
            vec![
                TagEntry { name: "Proliferate".to_string(), deck_count: Some(1234) },
                TagEntry { name: "Superfriends".to_string(), deck_count: Some(1200) },
            ]
        );
    }

    #[test]
    fn test_extract_tags_merges_passes() {
        let html = r#"<html><body>
            <a href="/tags/legendary-matters">Legendary Matters (2,048)</a>
            <script id="__NEXT_DATA__" type="application/json">{"props":{"pageProps":{"commander":{"themes":["Legendary Matters","Auras"]}}}}</script>
        </body></html>"#;
        let page = RawPage::from_html("https://edhrec.com/commanders/jodah-the-unifier", html.to_string());
        let tags = extract_tags(&page);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].name, "Legendary Matters");
        assert_eq!(tags[0].deck_count, Some(2048));
        assert_eq!(tags[1].deck_count, None);
    }
}
