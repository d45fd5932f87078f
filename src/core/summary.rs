//! 指揮官概要、主題 tag 頁與 tag 索引

use crate::core::average_deck::page_path;
use crate::core::color_identity::canonicalize_identity;
use crate::core::fetcher::PageFetcher;
use crate::core::name_resolver::slugify;
use crate::core::payload::RawPage;
use crate::core::sections::extract_sections;
use crate::core::site::EdhrecSite;
use crate::core::tag_walker::{extract_tags, normalize_tag_name, parse_count_text, split_name_and_count};
use crate::domain::model::{
    CommanderIdentity, CommanderSummary, TagEntry, TagIndex, TagIndexEntry, TagTheme,
};
use crate::domain::ports::{ConfigProvider, HttpTransport};
use crate::utils::error::{Result, ScoutError};
use crate::utils::retry::RetryConfig;
use regex::Regex;
use scraper::{Html, Selector};
use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

pub const TOP_TAG_LIMIT: usize = 10;

const BUDGET_SEGMENTS: [&str; 2] = ["budget", "expensive"];

fn tag_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:https?://[^/]+)?/tags/([a-z0-9\-]+)(?:/([a-z0-9\-]+))?/?$").expect("valid tag path regex")
    })
}

/// `None`/空字串 → 不分預算；"budget"/"expensive" 之外一律拒絕
pub fn normalize_budget(budget: Option<&str>) -> Result<Option<String>> {
    let Some(raw) = budget else {
        return Ok(None);
    };
    let lowered = raw.trim().to_lowercase();
    if lowered.is_empty() {
        return Ok(None);
    }
    if BUDGET_SEGMENTS.contains(&lowered.as_str()) {
        Ok(Some(lowered))
    } else {
        Err(ScoutError::InvalidConfigValue {
            field: "budget".to_string(),
            value: raw.to_string(),
            reason: "expected 'budget' or 'expensive'".to_string(),
        })
    }
}

/// 依牌組數遞減，同數保留發現順序；沒有計數的排最後
pub fn top_tags(tags: &[TagEntry], limit: usize) -> Vec<TagEntry> {
    let mut sorted = tags.to_vec();
    sorted.sort_by_key(|tag| Reverse(tag.deck_count));
    sorted.truncate(limit);
    sorted
}

/// `/tags` 頁面上的連結 → 索引項目，以 (slug, identity) 去重
pub fn parse_tag_index(html: &str) -> Vec<TagIndexEntry> {
    let Ok(anchor_sel) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    let mut seen: HashSet<(String, Option<String>)> = HashSet::new();
    let mut entries = Vec::new();

    for anchor in document.select(&anchor_sel) {
        let href = anchor.value().attr("href").unwrap_or_default();
        let Some(caps) = tag_path_re().captures(href) else {
            continue;
        };
        let Some(slug) = caps.get(1).map(|m| m.as_str().to_string()) else {
            continue;
        };
        let identity = caps.get(2).map(|m| m.as_str().to_string());

        let text = anchor
            .text()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let (raw_name, inline_count) = split_name_and_count(&text);
        let Some(name) = normalize_tag_name(&raw_name) else {
            continue;
        };

        let deck_count = ["data-tag-count", "data-count", "data-deck-count"]
            .iter()
            .filter_map(|attr| anchor.value().attr(attr))
            .find_map(parse_count_text)
            .or(inline_count);

        if seen.insert((slug.clone(), identity.clone())) {
            entries.push(TagIndexEntry {
                slug,
                name,
                identity,
                deck_count,
            });
        }
    }

    entries
}

/// 指揮官頁與 tag 頁的查詢
pub struct SummaryService {
    fetcher: PageFetcher,
    site: EdhrecSite,
}

impl SummaryService {
    pub fn new(transport: Arc<dyn HttpTransport>, config: &dyn ConfigProvider) -> Self {
        let retry = RetryConfig::new(config.retry_attempts(), config.retry_initial_delay());
        Self {
            fetcher: PageFetcher::new(transport, retry),
            site: EdhrecSite::new(config.base_url()),
        }
    }

    /// 依 slug 候選順序找第一個存在的指揮官子頁面
    async fn fetch_commander_page(&self, commander: &CommanderIdentity, segment: &str) -> Result<(String, RawPage)> {
        let mut last_url = String::new();
        for slug in commander.slug_candidates() {
            let url = self.site.commander_subpage(&slug, segment);
            if let Some(html) = self.fetcher.probe(&url).await? {
                return Ok((slug, RawPage::from_html(&url, html)));
            }
            debug!("No commander page at {}", url);
            last_url = url;
        }

        Err(ScoutError::NotFound {
            message: format!("Commander page not found for '{}'", commander.raw_name),
            url: last_url,
            hints: vec!["Check spelling/front-face name".to_string()],
        })
    }

    fn json_url(&self, page: &RawPage) -> Option<String> {
        page.build_id
            .as_deref()
            .map(|build_id| self.site.next_data(build_id, &page_path(&page.url)))
    }

    pub async fn fetch_commander_summary(&self, name: &str, budget: Option<&str>) -> Result<CommanderSummary> {
        let budget = normalize_budget(budget)?;
        let commander = CommanderIdentity::resolve(name)?;

        let (slug, page) = self
            .fetch_commander_page(&commander, budget.as_deref().unwrap_or(""))
            .await?;
        let categories = extract_sections(page.payload()?);
        let tags = extract_tags(&page);

        info!("Summary for {}: {} tags, {} categories", commander.display_name, tags.len(), categories.len());
        Ok(CommanderSummary {
            commander_name: commander.display_name,
            slug,
            budget,
            source_url: page.url.clone(),
            categories,
            top_tags: top_tags(&tags, TOP_TAG_LIMIT),
            tags,
        })
    }

    pub async fn fetch_tag_theme(&self, tag: &str, identity: Option<&str>) -> Result<TagTheme> {
        let tag_slug = slugify(tag);
        let identity = identity
            .filter(|value| !value.trim().is_empty())
            .map(canonicalize_identity)
            .transpose()?;

        let url = self
            .site
            .tag_page(&tag_slug, identity.as_ref().map(|i| i.slug.as_str()));
        let page = RawPage::from_html(&url, self.fetcher.get_text(&url).await?);
        let categories = extract_sections(page.payload()?);

        Ok(TagTheme {
            tag: tag_slug,
            identity,
            commander: None,
            json_url: self.json_url(&page),
            header: page.title(),
            description: page.meta_description(),
            source_url: page.url.clone(),
            categories,
        })
    }

    pub async fn fetch_commander_tag_theme(&self, name: &str, tag: &str) -> Result<TagTheme> {
        let commander = CommanderIdentity::resolve(name)?;
        let tag_slug = slugify(tag);

        let (_, page) = self.fetch_commander_page(&commander, &tag_slug).await?;
        let categories = extract_sections(page.payload()?);

        Ok(TagTheme {
            tag: tag_slug,
            identity: None,
            commander: Some(commander.display_name),
            json_url: self.json_url(&page),
            header: page.title(),
            description: page.meta_description(),
            source_url: page.url.clone(),
            categories,
        })
    }

    pub async fn fetch_tag_index(&self) -> Result<TagIndex> {
        let url = self.site.tag_index();
        let html = self.fetcher.get_text(&url).await?;
        let tags = parse_tag_index(&html);
        info!("Tag index lists {} tags", tags.len());
        Ok(TagIndex { source_url: url, tags })
    }
}
