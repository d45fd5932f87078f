use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://edhrec.com";
pub const DEFAULT_USER_AGENT: &str = "edhrec-scout/0.1";

/// 內容網站的頁面路徑
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdhrecSite {
    base_url: String,
}

impl Default for EdhrecSite {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl EdhrecSite {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 站內相對路徑 → 絕對 URL；已是絕對 URL 則原樣回傳
    pub fn absolute(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    fn with_optional_segment(&self, path: String, segment: &str) -> String {
        if segment.is_empty() {
            self.absolute(&path)
        } else {
            self.absolute(&format!("{}/{}", path, segment))
        }
    }

    pub fn commander_page(&self, slug: &str) -> String {
        self.absolute(&format!("commanders/{}", slug))
    }

    pub fn commander_subpage(&self, slug: &str, segment: &str) -> String {
        self.with_optional_segment(format!("commanders/{}", slug), segment)
    }

    pub fn average_deck(&self, slug: &str, bracket_segment: &str) -> String {
        self.with_optional_segment(format!("average-decks/{}", slug), bracket_segment)
    }

    pub fn tag_page(&self, tag_slug: &str, identity_slug: Option<&str>) -> String {
        self.with_optional_segment(format!("tags/{}", tag_slug), identity_slug.unwrap_or(""))
    }

    pub fn tag_index(&self) -> String {
        self.absolute("tags")
    }

    pub fn search(&self, query: &str) -> String {
        let base = self.absolute("search");
        match Url::parse_with_params(&base, &[("q", query)]) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}?q={}", base, query),
        }
    }

    /// 每個 build 專屬的 JSON 資料端點
    pub fn next_data(&self, build_id: &str, page_path: &str) -> String {
        self.absolute(&format!(
            "_next/data/{}/{}.json",
            build_id,
            page_path.trim_matches('/')
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_urls() {
        let site = EdhrecSite::default();
        assert_eq!(
            site.average_deck("jodah-the-unifier", "upgraded"),
            "https://edhrec.com/average-decks/jodah-the-unifier/upgraded"
        );
        assert_eq!(
            site.average_deck("jodah-the-unifier", ""),
            "https://edhrec.com/average-decks/jodah-the-unifier"
        );
        assert_eq!(site.commander_page("atraxa-praetors-voice"), "https://edhrec.com/commanders/atraxa-praetors-voice");
        assert_eq!(site.tag_page("prowess", Some("jeskai")), "https://edhrec.com/tags/prowess/jeskai");
        assert_eq!(site.tag_page("prowess", None), "https://edhrec.com/tags/prowess");
    }

    #[test]
    fn test_search_encodes_query() {
        let site = EdhrecSite::new("https://edhrec.com/");
        assert_eq!(
            site.search("Jodah, the Unifier"),
            "https://edhrec.com/search?q=Jodah%2C+the+Unifier"
        );
    }

    #[test]
    fn test_next_data_url() {
        let site = EdhrecSite::default();
        assert_eq!(
            site.next_data("abc123", "/average-decks/jodah-the-unifier/upgraded"),
            "https://edhrec.com/_next/data/abc123/average-decks/jodah-the-unifier/upgraded.json"
        );
    }

    #[test]
    fn test_absolute_keeps_full_urls() {
        let site = EdhrecSite::new("http://127.0.0.1:9000");
        assert_eq!(site.absolute("https://edhrec.com/tags/x"), "https://edhrec.com/tags/x");
        assert_eq!(site.absolute("/tags/x"), "http://127.0.0.1:9000/tags/x");
    }
}
