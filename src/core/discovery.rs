//! Average-deck URL discovery.
//!
//! 三層退路：指揮官頁面上的連結 → 直接組出的網址 → 站內搜尋。
//! 每一層都是 `DiscoveryState` 的一個狀態，終態為 Done / NotFound / BracketUnavailable。

use crate::core::bracket::{coerce_segment, display_label};
use crate::core::fetcher::PageFetcher;
use crate::core::payload::RawPage;
use crate::core::site::EdhrecSite;
use crate::domain::model::{Bracket, CommanderIdentity, DiscoveryResult};
use crate::utils::error::{Result, ScoutError};
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

fn average_deck_href_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"href="((?:https?://[^"/]+)?/average-decks/[a-z0-9\-]+(?:/[a-z0-9\-]+){0,2})""#)
            .expect("valid average deck link regex")
    })
}

fn average_deck_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:https?://[^/]+)?/average-decks/([a-z0-9\-]+)(?:/([a-z0-9\-]+)(?:/([a-z0-9\-]+))?)?$")
            .expect("valid average deck path regex")
    })
}

fn commander_href_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"href="(?:https?://[^"/]+)?/commanders/([a-z0-9\-]+)""#).expect("valid commander link regex"))
}

/// 頁面上的 average-deck 連結
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AverageDeckLink {
    pub href: String,
    pub slug: String,
    /// canonical bracket segment
    pub segment: String,
}

/// 收集頁面上所有可辨識 bracket 的 average-deck 連結 (依出現順序去重)
pub fn scan_average_deck_links(html: &str) -> Vec<AverageDeckLink> {
    let mut seen = HashSet::new();
    average_deck_href_re()
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .filter(|href| seen.insert(href.to_string()))
        .filter_map(|href| {
            let caps = average_deck_path_re().captures(href)?;
            let slug = caps.get(1)?.as_str().to_string();
            let raw_bracket = [caps.get(2), caps.get(3)]
                .iter()
                .flatten()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join("/");
            let segment = coerce_segment(&raw_bracket)?;
            Some(AverageDeckLink {
                href: href.to_string(),
                slug,
                segment,
            })
        })
        .collect()
}

fn available_labels(links: &[AverageDeckLink]) -> BTreeSet<String> {
    links.iter().map(|link| display_label(&link.segment)).collect()
}

/// 探索成功：來源網址與 (若有抓到) 指揮官頁面
#[derive(Debug, Clone)]
pub struct Discovered {
    pub result: DiscoveryResult,
    pub commander_page: Option<RawPage>,
    /// 直接網址層探測時已下載的牌組頁面
    pub deck_page: Option<RawPage>,
}

#[derive(Debug)]
pub enum DiscoveryState {
    TryCommanderPage,
    TryDirectUrl { commander_page: Option<RawPage> },
    TrySiteSearch { commander_page: Option<RawPage> },
    Done(Discovered),
    NotFound { search_url: String },
    BracketUnavailable { available: BTreeSet<String>, commander_url: String },
}

pub struct UrlDiscoverer<'a> {
    fetcher: &'a PageFetcher,
    site: &'a EdhrecSite,
}

impl<'a> UrlDiscoverer<'a> {
    pub fn new(fetcher: &'a PageFetcher, site: &'a EdhrecSite) -> Self {
        Self { fetcher, site }
    }

    pub async fn discover(&self, commander: &CommanderIdentity, bracket: &Bracket) -> Result<Discovered> {
        let mut deferred: Option<ScoutError> = None;
        let mut state = DiscoveryState::TryCommanderPage;
        loop {
            state = match state {
                DiscoveryState::TryCommanderPage => {
                    self.try_commander_page(commander, bracket, &mut deferred).await?
                }
                DiscoveryState::TryDirectUrl { commander_page } => {
                    self.try_direct_url(commander, bracket, commander_page, &mut deferred)
                        .await?
                }
                DiscoveryState::TrySiteSearch { commander_page } => {
                    self.try_site_search(commander, bracket, commander_page).await?
                }
                DiscoveryState::Done(discovered) => {
                    info!("Resolved {} [{}] -> {}", commander.display_name, bracket.display_label, discovered.result.source_url);
                    return Ok(discovered);
                }
                DiscoveryState::NotFound { search_url } => {
                    // 前面的層若是暫時性失敗，回報該錯誤而不是 NotFound
                    if let Some(err) = deferred.take() {
                        return Err(err);
                    }
                    return Err(ScoutError::NotFound {
                        message: format!("Could not resolve average-decks URL for '{}'", commander.raw_name),
                        url: search_url,
                        hints: vec![
                            "Check spelling/front-face name".to_string(),
                            "Pair may be too new or not indexed".to_string(),
                        ],
                    });
                }
                DiscoveryState::BracketUnavailable { available, commander_url } => {
                    return Err(ScoutError::BracketUnavailable {
                        name: commander.raw_name.clone(),
                        bracket: bracket.raw_input.clone(),
                        available: available.into_iter().collect(),
                        commander_url,
                    });
                }
            };
        }
    }

    /// 重試後仍是暫時性錯誤時視為未命中，錯誤留在 `deferred`
    async fn probe_or_defer(&self, url: &str, deferred: &mut Option<ScoutError>) -> Result<Option<String>> {
        match self.fetcher.probe(url).await {
            Err(err) if err.is_transient() => {
                warn!("Skipping {} after retries: {}", url, err);
                *deferred = Some(err);
                Ok(None)
            }
            other => other,
        }
    }

    pub async fn try_commander_page(
        &self,
        commander: &CommanderIdentity,
        bracket: &Bracket,
        deferred: &mut Option<ScoutError>,
    ) -> Result<DiscoveryState> {
        for slug in commander.slug_candidates() {
            let url = self.site.commander_page(&slug);
            let Some(html) = self.probe_or_defer(&url, deferred).await? else {
                debug!("No commander page at {}", url);
                continue;
            };

            let links = scan_average_deck_links(&html);
            let page = RawPage::from_html(&url, html);
            if links.is_empty() {
                debug!("Commander page {} lists no average decks", url);
                return Ok(DiscoveryState::TryDirectUrl { commander_page: Some(page) });
            }

            let available = available_labels(&links);
            return Ok(match links.iter().find(|link| link.segment == bracket.canonical_segment) {
                Some(link) => DiscoveryState::Done(Discovered {
                    result: DiscoveryResult {
                        source_url: self.site.absolute(&link.href),
                        canonical_slug: link.slug.clone(),
                        canonical_bracket: link.segment.clone(),
                        available_brackets: available,
                    },
                    commander_page: Some(page),
                    deck_page: None,
                }),
                None => DiscoveryState::BracketUnavailable {
                    available,
                    commander_url: url,
                },
            });
        }

        Ok(DiscoveryState::TryDirectUrl { commander_page: None })
    }

    pub async fn try_direct_url(
        &self,
        commander: &CommanderIdentity,
        bracket: &Bracket,
        commander_page: Option<RawPage>,
        deferred: &mut Option<ScoutError>,
    ) -> Result<DiscoveryState> {
        for slug in commander.slug_candidates() {
            let url = self.site.average_deck(&slug, &bracket.canonical_segment);
            if let Some(html) = self.probe_or_defer(&url, deferred).await? {
                let deck_page = RawPage::from_html(&url, html);
                return Ok(DiscoveryState::Done(Discovered {
                    result: DiscoveryResult {
                        source_url: url,
                        canonical_slug: slug,
                        canonical_bracket: bracket.canonical_segment.clone(),
                        available_brackets: BTreeSet::from([bracket.display_label.clone()]),
                    },
                    commander_page,
                    deck_page: Some(deck_page),
                }));
            }
            debug!("No average deck at {}", url);
        }

        Ok(DiscoveryState::TrySiteSearch { commander_page })
    }

    pub async fn try_site_search(
        &self,
        commander: &CommanderIdentity,
        bracket: &Bracket,
        commander_page: Option<RawPage>,
    ) -> Result<DiscoveryState> {
        let search_url = self.site.search(&commander.raw_name);
        let Some(html) = self.fetcher.probe(&search_url).await? else {
            return Ok(DiscoveryState::NotFound { search_url });
        };

        let links = scan_average_deck_links(&html);
        let matched = links
            .iter()
            .find(|link| link.segment == bracket.canonical_segment)
            .map(|link| (self.site.absolute(&link.href), link.slug.clone()));

        // 沒有對應 bracket 的連結時，沿用搜尋結果中的 slug
        let fallback_slug = || {
            links.first().map(|link| link.slug.clone()).or_else(|| {
                commander_href_re()
                    .captures(&html)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().to_string())
            })
        };

        let resolved = matched.or_else(|| {
            fallback_slug().map(|slug| (self.site.average_deck(&slug, &bracket.canonical_segment), slug))
        });

        Ok(match resolved {
            Some((source_url, slug)) => DiscoveryState::Done(Discovered {
                result: DiscoveryResult {
                    source_url,
                    canonical_slug: slug,
                    canonical_bracket: bracket.canonical_segment.clone(),
                    available_brackets: BTreeSet::from([bracket.display_label.clone()]),
                },
                commander_page,
                deck_page: None,
            }),
            None => DiscoveryState::NotFound { search_url },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_links() {
        let html = r#"
            <a href="/average-decks/jodah-the-unifier">All</a>
            <a href="/average-decks/jodah-the-unifier/upgraded">Upgraded</a>
            <a href="https://edhrec.com/average-decks/jodah-the-unifier/cedh/budget">cEDH budget</a>
            <a href="/average-decks/jodah-the-unifier/upgraded">Upgraded again</a>
            <a href="/average-decks/jodah-the-unifier/weird">Weird</a>
        "#;
        let links = scan_average_deck_links(html);
        let segments: Vec<&str> = links.iter().map(|l| l.segment.as_str()).collect();
        assert_eq!(segments, vec!["", "upgraded", "cedh/budget"]);
        assert_eq!(links[2].slug, "jodah-the-unifier");

        let labels: Vec<String> = available_labels(&links).into_iter().collect();
        assert_eq!(labels, vec!["all", "cedh/budget", "upgraded"]);
    }

    #[test]
    fn test_aliased_link_segments() {
        let links = scan_average_deck_links(r#"<a href="/average-decks/atraxa/cedh-expensive">x</a>"#);
        assert_eq!(links[0].segment, "cedh/expensive");
    }
}
