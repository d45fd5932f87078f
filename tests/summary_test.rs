use edhrec_scout::{ReqwestTransport, ScoutError, SummaryService, TomlConfig};
use httpmock::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;

const ATRAXA: &str = "Atraxa, Praetors' Voice";

fn service_for(server: &MockServer) -> SummaryService {
    let config = TomlConfig::from_toml_str(&format!(
        "[source]\nbase_url = \"{}\"\nretry_attempts = 1\nretry_delay_ms = 1\n",
        server.base_url()
    ))
    .unwrap();
    let transport = ReqwestTransport::from_config(&config).unwrap();
    SummaryService::new(Arc::new(transport), &config)
}

fn page_html(head: &str, payload: &Value, body: &str) -> String {
    format!(
        r#"<html><head>{}</head><body>{}<script id="__NEXT_DATA__" type="application/json">{}</script></body></html>"#,
        head, body, payload
    )
}

fn atraxa_payload() -> Value {
    json!({
        "props": {"pageProps": {
            "commander": {
                "metadata": {"tagCloud": [
                    {"name": "Proliferate", "deckCount": 1234, "slug": "/tags/proliferate"},
                    {"name": "Angels", "deckCount": 987, "slug": "/tags/angels"},
                    {"name": "Kindred", "deckCount": 5000},
                    {"name": "Themes", "deckCount": 4000}
                ]}
            },
            "data": {"container": {"json_dict": {"cardlists": [
                {"header": "High Synergy Cards", "cardviews": [
                    {"name": "Evolution Sage", "synergy": 0.52, "num_decks": 4100, "potential_decks": 9000}
                ]},
                {"header": "Top Cards", "cardviews": [{"name": "Sol Ring"}]}
            ]}}}
        }},
        "buildId": "atraxa-build"
    })
}

#[tokio::test]
async fn test_commander_summary_tags_and_categories() {
    let server = MockServer::start();
    let page_mock = server.mock(|when, then| {
        when.method(GET).path("/commanders/atraxa-praetors-voice");
        then.status(200)
            .body(page_html("<title>Atraxa</title>", &atraxa_payload(), ""));
    });

    let service = service_for(&server);
    let summary = service.fetch_commander_summary(ATRAXA, None).await.unwrap();

    page_mock.assert();
    assert_eq!(summary.slug, "atraxa-praetors-voice");
    assert!(summary.budget.is_none());

    let tags: Vec<(&str, Option<u64>)> = summary
        .tags
        .iter()
        .map(|t| (t.name.as_str(), t.deck_count))
        .collect();
    assert_eq!(tags, vec![("Proliferate", Some(1234)), ("Angels", Some(987))]);
    assert_eq!(summary.top_tags[0].name, "Proliferate");

    let synergy = &summary.categories["High Synergy Cards"][0];
    assert_eq!(synergy.name, "Evolution Sage");
    assert_eq!(synergy.synergy_percent, Some(52.0));
    assert_eq!(synergy.deck_count, Some(4100));
    assert_eq!(summary.categories["Top Cards"][0].name, "Sol Ring");
}

#[tokio::test]
async fn test_navigation_panel_counts() {
    let server = MockServer::start();
    let panel = r#"
        <div class="NavigationPanel_tags__x1y2">
          <a href="/tags/ninjas"><span class="NavigationPanel_label__a1">Ninjas</span><span class="NavigationPanel_count__b2">1,500</span></a>
          <a href="/tags/mutant">Mutant (250)</a>
        </div>
    "#;
    let payload = json!({"props": {"pageProps": {"commander": {}}}});
    server.mock(|when, then| {
        when.method(GET).path("/commanders/leonardo-the-balance");
        then.status(200).body(page_html("", &payload, panel));
    });

    let service = service_for(&server);
    let summary = service
        .fetch_commander_summary("Leonardo, the Balance", None)
        .await
        .unwrap();

    let tags: Vec<(&str, Option<u64>)> = summary
        .tags
        .iter()
        .map(|t| (t.name.as_str(), t.deck_count))
        .collect();
    assert_eq!(tags, vec![("Ninjas", Some(1500)), ("Mutant", Some(250))]);
}

#[tokio::test]
async fn test_tags_without_counts_keep_page_order() {
    let server = MockServer::start();
    let payload = json!({"props": {"pageProps": {"commander": {
        "themes": ["Card Draw", "Token Swarm"]
    }}}});
    server.mock(|when, then| {
        when.method(GET).path("/commanders/ezuri-claw-of-progress/budget");
        then.status(200).body(page_html("", &payload, ""));
    });

    let service = service_for(&server);
    let summary = service
        .fetch_commander_summary("Ezuri, Claw of Progress", Some("Budget"))
        .await
        .unwrap();

    assert_eq!(summary.budget.as_deref(), Some("budget"));
    assert!(summary.source_url.ends_with("/commanders/ezuri-claw-of-progress/budget"));
    let names: Vec<&str> = summary.top_tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Card Draw", "Token Swarm"]);
    assert!(summary.top_tags.iter().all(|t| t.deck_count.is_none()));
}

#[tokio::test]
async fn test_invalid_budget_makes_no_request() {
    let server = MockServer::start();
    let page_mock = server.mock(|when, then| {
        when.method(GET).path("/commanders/atraxa-praetors-voice/invalid");
        then.status(200).body("");
    });

    let service = service_for(&server);
    let err = service
        .fetch_commander_summary(ATRAXA, Some("invalid"))
        .await
        .unwrap_err();

    assert!(matches!(err, ScoutError::InvalidConfigValue { .. }));
    assert_eq!(page_mock.hits(), 0);
}

#[tokio::test]
async fn test_missing_commander_page() {
    let server = MockServer::start();
    let service = service_for(&server);

    match service.fetch_commander_summary("Nobody, the Unknown", None).await {
        Err(ScoutError::NotFound { url, .. }) => {
            assert!(url.ends_with("/commanders/nobody-the-unknown"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_tag_theme_with_identity() {
    let server = MockServer::start();
    let payload = json!({
        "props": {"pageProps": {"data": {"container": {"json_dict": {"cardlists": [
            {"header": "Top Cards", "cardviews": [{"name": "Young Pyromancer"}]}
        ]}}}}},
        "buildId": "tags-build"
    });
    let head = r#"<title> Prowess | Jeskai </title><meta name="description" content="Best prowess cards" />"#;
    let tag_mock = server.mock(|when, then| {
        when.method(GET).path("/tags/prowess/jeskai");
        then.status(200).body(page_html(head, &payload, ""));
    });

    let service = service_for(&server);
    let theme = service.fetch_tag_theme("Prowess", Some("ruw")).await.unwrap();

    tag_mock.assert();
    assert_eq!(theme.tag, "prowess");
    assert_eq!(theme.identity.as_ref().unwrap().slug, "jeskai");
    assert_eq!(theme.header.as_deref(), Some("Prowess | Jeskai"));
    assert_eq!(theme.description.as_deref(), Some("Best prowess cards"));
    assert!(theme
        .json_url
        .as_deref()
        .unwrap()
        .ends_with("/_next/data/tags-build/tags/prowess/jeskai.json"));
    assert_eq!(theme.categories["Top Cards"][0].name, "Young Pyromancer");
}

#[tokio::test]
async fn test_tag_theme_rejects_unknown_identity() {
    let server = MockServer::start();
    let service = service_for(&server);

    assert!(matches!(
        service.fetch_tag_theme("prowess", Some("xyz")).await,
        Err(ScoutError::IdentityUnsupported { .. })
    ));
}

#[tokio::test]
async fn test_commander_tag_theme() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/commanders/atraxa-praetors-voice/proliferate");
        then.status(200)
            .body(page_html("<title>Atraxa Proliferate</title>", &atraxa_payload(), ""));
    });

    let service = service_for(&server);
    let theme = service
        .fetch_commander_tag_theme(ATRAXA, "Proliferate")
        .await
        .unwrap();

    assert_eq!(theme.commander.as_deref(), Some(ATRAXA));
    assert_eq!(theme.tag, "proliferate");
    assert!(theme.identity.is_none());
    assert!(theme.categories.contains_key("High Synergy Cards"));
}

#[tokio::test]
async fn test_tag_index() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/tags");
        then.status(200).body(
            r#"<html><body>
                <a href="/tags/proliferate">Proliferate (1,234)</a>
                <a href="/tags/angels" data-count="987">Angels</a>
                <a href="/tags/kindred">Kindred</a>
                <a href="/commanders/atraxa-praetors-voice">Atraxa</a>
            </body></html>"#,
        );
    });

    let service = service_for(&server);
    let index = service.fetch_tag_index().await.unwrap();

    assert!(index.source_url.ends_with("/tags"));
    let entries: Vec<(&str, Option<u64>)> = index
        .tags
        .iter()
        .map(|t| (t.slug.as_str(), t.deck_count))
        .collect();
    assert_eq!(entries, vec![("proliferate", Some(1234)), ("angels", Some(987))]);
}
