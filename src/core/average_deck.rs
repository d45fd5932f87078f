use crate::core::cache::{CacheKey, Clock, ResultCache};
use crate::core::card_walker::find_cards_in_payload;
use crate::core::commander_split::split_commander;
use crate::core::discovery::UrlDiscoverer;
use crate::core::fetcher::PageFetcher;
use crate::core::hydration::hydrate_in_order;
use crate::core::payload::RawPage;
use crate::core::sections::extract_sections;
use crate::core::site::EdhrecSite;
use crate::core::tag_walker::extract_tags;
use crate::domain::model::{Bracket, CardEntry, CommanderIdentity, DeckResult, HydratedCard};
use crate::domain::ports::{CardEnricher, ConfigProvider, HttpTransport};
use crate::utils::error::{Result, ScoutError};
use crate::utils::retry::RetryConfig;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// 平均牌組查詢：探索 → 抓取 → 解析 → 分離指揮官 → 快取
pub struct AverageDeckService {
    fetcher: PageFetcher,
    site: EdhrecSite,
    cache: ResultCache<DeckResult>,
    cache_ttl: Duration,
    concurrency: usize,
}

impl AverageDeckService {
    pub fn new(transport: Arc<dyn HttpTransport>, config: &dyn ConfigProvider) -> Self {
        let retry = RetryConfig::new(config.retry_attempts(), config.retry_initial_delay());
        Self {
            fetcher: PageFetcher::new(transport, retry),
            site: EdhrecSite::new(config.base_url()),
            cache: ResultCache::new(config.cache_ttl()),
            cache_ttl: config.cache_ttl(),
            concurrency: config.concurrent_requests(),
        }
    }

    /// 測試用：替換快取的時間來源
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.cache = ResultCache::with_clock(self.cache_ttl, clock);
        self
    }

    pub fn site(&self) -> &EdhrecSite {
        &self.site
    }

    pub async fn fetch_average_deck(&self, name: &str, bracket: Option<&str>) -> Result<DeckResult> {
        let commander = CommanderIdentity::resolve(name)?;
        let bracket = Bracket::require(bracket)?;

        let key = CacheKey::new(&commander.slug, &bracket.canonical_segment);
        if let Some(cached) = self.cache.get(&key) {
            info!("Serving {} [{}] from cache", commander.display_name, bracket.display_label);
            return Ok(cached);
        }

        let mut discovered = UrlDiscoverer::new(&self.fetcher, &self.site)
            .discover(&commander, &bracket)
            .await?;
        let source_url = discovered.result.source_url.clone();

        let page = match discovered.deck_page.take() {
            Some(page) => page,
            None => RawPage::from_html(&source_url, self.fetcher.get_text(&source_url).await?),
        };
        let cards = self.deck_cards(&page).await?;
        let (commander_card, body) = split_commander(&commander, cards);

        let aux_page = discovered.commander_page.as_ref().unwrap_or(&page);
        let (tags, sections) = match &aux_page.embedded_json {
            Some(root) => (extract_tags(aux_page), extract_sections(root)),
            None => {
                warn!("No embedded payload on {}; tags and sections left empty", aux_page.url);
                (extract_tags(aux_page), Default::default())
            }
        };

        let result = DeckResult {
            commander_name: commander.display_name.clone(),
            bracket: bracket.display_label.clone(),
            source_url,
            cards: body.into_iter().filter(|c| c.qty > 0 && !c.name.is_empty()).collect(),
            commander_card,
            tags,
            sections,
            available_brackets: discovered.result.available_brackets.into_iter().collect(),
        };
        info!(
            "Parsed {} cards for {} [{}]",
            result.total_cards(),
            result.commander_name,
            result.bracket
        );

        self.cache.insert(key, result.clone());
        Ok(result)
    }

    /// HTML 內嵌資料沒有卡片時，改抓 per-build JSON 端點；兩者都失敗回報原本的錯誤
    async fn deck_cards(&self, page: &RawPage) -> Result<Vec<CardEntry>> {
        let primary = page
            .payload()
            .and_then(|root| find_cards_in_payload(root, &page.url));

        let err = match primary {
            Ok(cards) => return Ok(cards),
            Err(err) => err,
        };
        let Some(build_id) = page.build_id.as_deref() else {
            return Err(err);
        };

        let json_url = self.site.next_data(build_id, &page_path(&page.url));
        warn!("{} (falling back to {})", err, json_url);
        match self.fetch_json_cards(&json_url).await {
            Ok(cards) => Ok(cards),
            Err(fallback_err) => {
                debug!("Data endpoint fallback failed: {}", fallback_err);
                Err(err)
            }
        }
    }

    async fn fetch_json_cards(&self, json_url: &str) -> Result<Vec<CardEntry>> {
        let text = self.fetcher.get_text(json_url).await?;
        let root: Value = serde_json::from_str(&text).map_err(|e| {
            ScoutError::parsing("Invalid JSON from data endpoint", json_url, Some(e.to_string()))
        })?;
        find_cards_in_payload(&root, json_url)
    }

    /// 以 `CardEnricher` 補上外部識別碼；單張失敗只留空
    pub async fn hydrate_cards(&self, deck: &DeckResult, enricher: &dyn CardEnricher) -> Vec<HydratedCard> {
        hydrate_in_order(deck.cards.iter(), self.concurrency, |card| async move {
            let external_id = match enricher.lookup(&card.name).await {
                Ok(id) => id,
                Err(e) => {
                    warn!("Lookup for '{}' failed: {}", card.name, e);
                    None
                }
            };
            HydratedCard {
                name: card.name.clone(),
                qty: card.qty,
                external_id,
            }
        })
        .await
    }
}

/// 絕對網址的路徑部分，例如 `/average-decks/jodah-the-unifier/upgraded`
pub(crate) fn page_path(url: &str) -> String {
    Url::parse(url)
        .map(|parsed| parsed.path().to_string())
        .unwrap_or_else(|_| url.to_string())
}
