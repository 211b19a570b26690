use lesession::{
    EngineConfig, EngineStats, Error, GlobalStats, RawMessage, SearchFilters, SearchOptions,
    SessionSearchEngine,
};
use std::fs;
use tempfile::tempdir;

fn greeting_engine() -> SessionSearchEngine {
    let mut engine = SessionSearchEngine::with_defaults().expect("engine");
    engine
        .index_messages(
            "s1",
            &[
                RawMessage::new("m1", "hello world", "alice"),
                RawMessage::new("m2", "goodbye", "bob"),
            ],
        )
        .expect("index s1");
    engine
}

fn global_stats(engine: &SessionSearchEngine) -> GlobalStats {
    match engine.get_stats(None) {
        EngineStats::Global(stats) => stats,
        EngineStats::Session(_) => panic!("expected global stats"),
    }
}

fn ids(response: &lesession::SearchResponse) -> Vec<&str> {
    response
        .results
        .iter()
        .map(|hit| hit.message.id.as_str())
        .collect()
}

fn numbered(count: usize) -> Vec<RawMessage> {
    const WORDS: [&str; 5] = ["apple", "banana", "cherry", "damson", "elderberry"];
    (0..count)
        .map(|i| RawMessage::new(format!("m{}", i), WORDS[i % WORDS.len()], "user"))
        .collect()
}

#[tokio::test]
async fn exact_content_search_finds_only_matching_message() {
    let mut engine = greeting_engine();

    let response = engine
        .search("s1", "hello", &SearchOptions::default())
        .await
        .expect("search");

    assert_eq!(ids(&response), vec!["m1"]);
    assert_eq!(response.total, 1);
    assert_eq!(response.session_id, "s1");
    assert_eq!(response.query, "hello");
}

#[tokio::test]
async fn exact_content_outranks_fuzzy_matches() {
    let mut engine = SessionSearchEngine::with_defaults().expect("engine");
    engine
        .index_messages(
            "s1",
            &[
                RawMessage::new("fuzzy", "deplyo the build", "alice"),
                RawMessage::new("exact", "deploy the build", "bob"),
                RawMessage::new("unrelated", "lunch plans", "carol"),
            ],
        )
        .expect("index");

    let response = engine
        .search("s1", "deploy the build", &SearchOptions::default())
        .await
        .expect("search");

    assert_eq!(response.results[0].message.id, "exact");
    assert!(!ids(&response).contains(&"unrelated"));
}

#[tokio::test]
async fn sender_filter_excludes_content_match() {
    let mut engine = greeting_engine();
    let options = SearchOptions {
        filters: SearchFilters {
            sender: Some("bob".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    let response = engine.search("s1", "hello", &options).await.expect("search");

    assert!(response.results.is_empty());
    assert_eq!(response.total, 0);
}

#[tokio::test]
async fn appended_messages_become_searchable() {
    let mut engine = greeting_engine();

    let report = engine
        .add_messages("s1", &[RawMessage::new("m3", "hello again", "alice")])
        .expect("append")
        .expect("non-empty batch");
    assert_eq!(report.added, 1);
    assert_eq!(report.total, 3);

    let response = engine
        .search("s1", "hello", &SearchOptions::default())
        .await
        .expect("search");

    let mut found = ids(&response);
    found.sort_unstable();
    assert_eq!(found, vec!["m1", "m3"]);
}

#[tokio::test]
async fn append_invalidates_cached_results() {
    let mut engine = greeting_engine();

    let before = engine
        .search("s1", "hello", &SearchOptions::default())
        .await
        .expect("first search");
    assert_eq!(before.total, 1);

    engine
        .add_messages("s1", &[RawMessage::new("m3", "hello again", "alice")])
        .expect("append");

    let after = engine
        .search("s1", "hello", &SearchOptions::default())
        .await
        .expect("second search");

    assert_eq!(after.total, 2);
    assert_eq!(global_stats(&engine).metrics.cache_hits, 0);
}

#[tokio::test]
async fn has_more_reports_results_past_the_page() {
    let mut engine = SessionSearchEngine::with_defaults().expect("engine");
    engine
        .index_messages(
            "s1",
            &[
                RawMessage::new("a", "deploy now", "x"),
                RawMessage::new("b", "deploy later", "y"),
                RawMessage::new("c", "deploy tomorrow", "z"),
            ],
        )
        .expect("index");

    let first_page = SearchOptions {
        limit: 2,
        ..Default::default()
    };
    let response = engine.search("s1", "deploy", &first_page).await.expect("search");
    assert_eq!(response.total, 3);
    assert_eq!(response.results.len(), 2);
    assert!(response.has_more);

    let last_page = SearchOptions {
        limit: 1,
        offset: 2,
        ..Default::default()
    };
    let response = engine.search("s1", "deploy", &last_page).await.expect("search");
    assert_eq!(response.total, 3);
    assert_eq!(response.results.len(), 1);
    assert!(!response.has_more);
}

#[tokio::test]
async fn attachment_name_is_suggested() {
    let mut engine = SessionSearchEngine::with_defaults().expect("engine");
    engine
        .index_messages(
            "s1",
            &[RawMessage::new("m1", "see attached", "dana").with_file("report.pdf", "application/pdf")],
        )
        .expect("index");

    let response = engine
        .search("s1", "report", &SearchOptions::default())
        .await
        .expect("search");
    assert_eq!(response.total, 1);

    let suggestions = engine
        .get_suggestions("s1", "report", 5)
        .await
        .expect("suggestions");
    assert!(
        suggestions.iter().any(|s| s.contains("report.pdf")),
        "got {:?}",
        suggestions
    );
}

#[tokio::test]
async fn empty_append_is_noop() {
    let mut engine = greeting_engine();
    assert!(engine.add_messages("s1", &[]).expect("append").is_none());
}

#[tokio::test]
async fn suggestions_include_matching_word() {
    let engine = greeting_engine();

    let suggestions = engine
        .get_suggestions("s1", "hel", 5)
        .await
        .expect("suggestions");

    assert!(suggestions.iter().any(|s| s == "hello"), "got {:?}", suggestions);
    assert!(suggestions.len() <= 5);
}

#[tokio::test]
async fn oversized_batch_keeps_most_recent() {
    let config = EngineConfig {
        max_index_size: 3,
        ..Default::default()
    };
    let mut engine = SessionSearchEngine::new(config).expect("engine");

    let report = engine.index_messages("s1", &numbered(5)).expect("index");
    assert_eq!(report.indexed, 3);
    assert_eq!(report.total, 5);
    assert!(report.truncated);

    let response = engine
        .search("s1", "apple", &SearchOptions::default())
        .await
        .expect("search");
    assert!(!ids(&response).contains(&"m0"));

    let response = engine
        .search("s1", "elderberry", &SearchOptions::default())
        .await
        .expect("search");
    assert_eq!(ids(&response), vec!["m4"]);
}

#[tokio::test]
async fn append_is_capped_at_max_index_size() {
    let config = EngineConfig {
        max_index_size: 3,
        ..Default::default()
    };
    let mut engine = SessionSearchEngine::new(config).expect("engine");
    engine.index_messages("s1", &numbered(2)).expect("index");

    let report = engine
        .add_messages(
            "s1",
            &[
                RawMessage::new("n1", "fig", "user"),
                RawMessage::new("n2", "grape", "user"),
            ],
        )
        .expect("append")
        .expect("non-empty batch");

    assert_eq!(report.added, 2);
    assert_eq!(report.total, 3);
}

#[tokio::test]
async fn repeated_search_is_served_from_cache() {
    let mut engine = greeting_engine();

    let first = engine
        .search("s1", "hello", &SearchOptions::default())
        .await
        .expect("first search");
    let second = engine
        .search("s1", "hello", &SearchOptions::default())
        .await
        .expect("second search");

    assert_eq!(
        serde_json::to_string(&first).expect("serialize"),
        serde_json::to_string(&second).expect("serialize")
    );

    let stats = global_stats(&engine);
    assert_eq!(stats.metrics.cache_hits, 1);
    assert_eq!(stats.metrics.cache_misses, 1);
    assert_eq!(stats.metrics.total_searches, 1);
    assert_eq!(stats.cache_entries, 1);
}

#[tokio::test]
async fn one_character_query_is_empty_two_is_processed() {
    let mut engine = SessionSearchEngine::with_defaults().expect("engine");
    engine
        .index_messages("s1", &[RawMessage::new("m1", "go home", "alice")])
        .expect("index");

    let short = engine
        .search("s1", "g", &SearchOptions::default())
        .await
        .expect("short query");
    assert!(short.results.is_empty());
    assert_eq!(short.total, 0);

    let two = engine
        .search("s1", "go", &SearchOptions::default())
        .await
        .expect("two character query");
    assert_eq!(ids(&two), vec!["m1"]);
}

#[tokio::test]
async fn search_without_index_fails() {
    let mut engine = SessionSearchEngine::with_defaults().expect("engine");

    let err = engine
        .search("missing", "hello", &SearchOptions::default())
        .await
        .expect_err("no index");

    assert_eq!(err, Error::index_not_found("missing"));
    assert_eq!(err.code(), "INDEX_NOT_FOUND");
}

#[tokio::test]
async fn messages_without_id_are_rejected() {
    let mut engine = SessionSearchEngine::with_defaults().expect("engine");

    let err = engine
        .index_messages("s1", &[RawMessage::new("", "hello", "alice")])
        .expect_err("missing id");

    assert_eq!(err.code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn wire_format_messages_index_and_search() {
    let json = r#"[
        {"id": 1, "content": "upload finished", "role": "assistant", "createdAt": 1704067200000},
        {"id": "2", "content": "see attached", "sender": "dana", "type": "file",
         "file": {"name": "report.pdf", "type": "application/pdf"}}
    ]"#;
    let messages: Vec<RawMessage> = serde_json::from_str(json).expect("parse messages");

    let mut engine = SessionSearchEngine::with_defaults().expect("engine");
    engine.index_messages("s1", &messages).expect("index");

    let response = engine
        .search("s1", "report", &SearchOptions::default())
        .await
        .expect("search");
    assert_eq!(ids(&response), vec!["2"]);

    let response = engine
        .search("s1", "upload", &SearchOptions::default())
        .await
        .expect("search");
    let hit = &response.results[0];
    assert_eq!(hit.message.id, "1");
    assert_eq!(hit.message.sender, "assistant");
    assert!(hit.message.timestamp.is_some());
}

#[tokio::test]
async fn config_file_limits_index_size() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    fs::write(&path, "max_index_size = 2\nenable_highlighting = false\n").expect("write config");

    let config = EngineConfig::load(&path).expect("load config");
    let mut engine = SessionSearchEngine::new(config).expect("engine");

    let report = engine.index_messages("s1", &numbered(4)).expect("index");
    assert_eq!(report.indexed, 2);

    let response = engine
        .search("s1", "damson", &SearchOptions::default())
        .await
        .expect("search");
    assert!(response.results[0].highlights.is_empty());
}

#[tokio::test]
async fn destroy_releases_everything() {
    let mut engine = greeting_engine();
    engine
        .search("s1", "hello", &SearchOptions::default())
        .await
        .expect("search");

    engine.destroy();

    let stats = global_stats(&engine);
    assert_eq!(stats.total_sessions, 0);
    assert_eq!(stats.cache_entries, 0);
    assert!(!engine.is_sweeping());
}
