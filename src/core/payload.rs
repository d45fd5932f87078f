//! 從伺服器端渲染的 HTML 取出內嵌的 `__NEXT_DATA__` JSON

use crate::utils::error::{Result, ScoutError};
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::OnceLock;

fn build_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""buildId"\s*:\s*"([^"]+)""#).expect("valid buildId regex"))
}

/// 抓回來的頁面；只存活於單次請求
#[derive(Debug, Clone)]
pub struct RawPage {
    pub url: String,
    pub html: String,
    pub embedded_json: Option<Value>,
    pub build_id: Option<String>,
    /// 解析失敗時的 (message, details)
    parse_failure: Option<(String, Option<String>)>,
}

impl RawPage {
    /// 不會失敗；內嵌資料缺失時在 `payload()` 才回報
    pub fn from_html(url: &str, html: String) -> Self {
        let build_id = extract_build_id(&html);
        let (embedded_json, parse_failure) = match extract_next_data(&html, url) {
            Ok(value) => (Some(value), None),
            Err(ScoutError::Parsing { message, details, .. }) => (None, Some((message, details))),
            Err(e) => (None, Some((e.to_string(), None))),
        };
        Self {
            url: url.to_string(),
            html,
            embedded_json,
            build_id,
            parse_failure,
        }
    }

    pub fn payload(&self) -> Result<&Value> {
        if let Some(value) = &self.embedded_json {
            return Ok(value);
        }
        match &self.parse_failure {
            Some((message, details)) => Err(ScoutError::parsing(
                message.clone(),
                self.url.clone(),
                details.clone(),
            )),
            None => Err(missing_payload(&self.url)),
        }
    }

    /// `<title>` 文字
    pub fn title(&self) -> Option<String> {
        let document = Html::parse_document(&self.html);
        let selector = Selector::parse("title").ok()?;
        let text = document
            .select(&selector)
            .next()?
            .text()
            .collect::<String>();
        let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
        (!cleaned.is_empty()).then_some(cleaned)
    }

    pub fn meta_description(&self) -> Option<String> {
        let document = Html::parse_document(&self.html);
        let selector = Selector::parse(r#"meta[name="description"]"#).ok()?;
        let content = document
            .select(&selector)
            .next()?
            .value()
            .attr("content")?
            .trim()
            .to_string();
        (!content.is_empty()).then_some(content)
    }
}

fn missing_payload(url: &str) -> ScoutError {
    ScoutError::parsing(
        "Missing __NEXT_DATA__ payload",
        url,
        Some("script id=__NEXT_DATA__".to_string()),
    )
}

/// 解析 `<script id="__NEXT_DATA__">`；缺少或不是合法 JSON 都回報 Parsing
pub fn extract_next_data(html: &str, url: &str) -> Result<Value> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script#__NEXT_DATA__")
        .map_err(|e| ScoutError::parsing("Invalid payload selector", url, Some(e.to_string())))?;

    let script = document.select(&selector).next().ok_or_else(|| missing_payload(url))?;
    let text = script.text().collect::<String>();
    if text.trim().is_empty() {
        return Err(missing_payload(url));
    }

    serde_json::from_str(&text)
        .map_err(|e| ScoutError::parsing("Invalid JSON in __NEXT_DATA__", url, Some(e.to_string())))
}

pub fn extract_build_id(html: &str) -> Option<String> {
    build_id_re()
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// `props.pageProps`，或 per-build JSON 端點的頂層 `pageProps`
pub fn page_props(root: &Value) -> Option<&Value> {
    root.get("props")
        .and_then(|props| props.get("pageProps"))
        .or_else(|| root.get("pageProps"))
        .filter(|v| v.is_object())
}
