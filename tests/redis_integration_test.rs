//! Search against a live Redis server (database 15), skipped when none is reachable

use std::collections::BTreeSet;
use std::sync::Arc;
use zset_search::search::*;
use zset_search::state::RedisStore;

const REDIS_URL: &str = "redis://127.0.0.1:6379/15";

async fn create_redis_search(test: &str) -> Option<Search> {
    let store = match RedisStore::new(REDIS_URL).await {
        Ok(store) => Arc::new(store),
        Err(_) => return None,
    };
    let namespace = format!("zset-search-test:{}:{}", test, std::process::id());
    Search::create(namespace, store).ok()
}

/// Drop everything the fixture wrote, including the id set
async fn cleanup(search: &Search, doc_ids: &[&str]) {
    for id in doc_ids {
        search.remove(*id).await.unwrap();
    }
    let keys = KeyScheme::new(search.namespace());
    search.store().delete(&keys.ids_key()).await.unwrap();
}

async fn index_fixture(search: &Search) {
    let docs = [
        ("1", Document::new().field("content", "ruby emerald").field("uid", 5).field("cid", 1)),
        (
            "2",
            Document::new()
                .field("content", "emerald orange emerald")
                .field("uid", 5)
                .field("cid", 2),
        ),
        (
            "3",
            Document::new()
                .field("content", "cucumber apple orange")
                .field("uid", 4)
                .field("cid", 2),
        ),
        (
            "4",
            Document::new()
                .field("content", "ORANGE apple pear")
                .field("uid", 5)
                .field("cid", 4),
        ),
        ("5", Document::new().field("content", "dog cat").field("uid", 6).field("cid", 4)),
    ];
    for (id, doc) in docs.iter() {
        search.index(doc, *id).await.unwrap();
    }
}

fn set(expected: &[&str]) -> BTreeSet<String> {
    expected.iter().map(|s| s.to_string()).collect()
}

async fn run(search: &Search, query: SearchQuery) -> BTreeSet<String> {
    search.query(&query, 0, -1).await.unwrap().into_iter().collect()
}

#[tokio::test]
async fn test_redis_scenario() {
    let Some(search) = create_redis_search("scenario").await else {
        eprintln!("Skipping test: Redis not available");
        return;
    };
    index_fixture(&search).await;

    let any = SearchQuery::new()
        .with_text("content", "apple orange")
        .with_value("uid", 5)
        .with_match_mode(MatchMode::Any);
    assert_eq!(run(&search, any).await, set(&["2", "4"]));

    let none = SearchQuery::new()
        .with_value("uid", 5)
        .with_text("content", "apple orange")
        .with_value("cid", 123);
    assert!(run(&search, none).await.is_empty());

    let one = SearchQuery::new()
        .with_value("uid", 5)
        .with_text("content", "emerald")
        .with_value("cid", 1);
    assert_eq!(run(&search, one).await, set(&["1"]));

    let uid = SearchQuery::new().with_value("uid", 5);
    assert_eq!(run(&search, uid.clone()).await, set(&["1", "2", "4"]));
    assert_eq!(search.query(&uid, 0, 1).await.unwrap().len(), 2);

    let list = SearchQuery::new().with_any_of("cid", [2, 4]);
    assert_eq!(run(&search, list).await, set(&["2", "3", "4", "5"]));

    let combined = SearchQuery::new()
        .with_any_of("cid", [2, 4])
        .with_text("content", "orange")
        .with_value("uid", 4);
    assert_eq!(run(&search, combined).await, set(&["3"]));

    let cucumber = SearchQuery::new().with_text("content", "CUCUMBER");
    assert_eq!(run(&search, cucumber).await, set(&["3"]));

    cleanup(&search, &["1", "2", "3", "4", "5"]).await;
}

#[tokio::test]
async fn test_redis_remove_and_count() {
    let Some(search) = create_redis_search("remove").await else {
        eprintln!("Skipping test: Redis not available");
        return;
    };
    index_fixture(&search).await;

    assert_eq!(search.count().await.unwrap(), 5);
    search.remove("4").await.unwrap();

    let uid = SearchQuery::new().with_value("uid", 5);
    assert_eq!(run(&search, uid).await, set(&["1", "2"]));
    assert_eq!(search.count().await.unwrap(), 5);

    let keys = KeyScheme::new(search.namespace());
    assert_eq!(
        search
            .store()
            .cardinality(&keys.field_registry_key("4"))
            .await
            .unwrap(),
        0
    );

    cleanup(&search, &["1", "2", "3", "5"]).await;
    assert_eq!(search.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_redis_aggregate_keys_trimmed() {
    let Some(search) = create_redis_search("trim").await else {
        eprintln!("Skipping test: Redis not available");
        return;
    };
    index_fixture(&search).await;

    let query = SearchQuery::new()
        .with_any_of("cid", [2, 4])
        .with_text("content", "apple orange")
        .with_value("uid", 5);
    assert_eq!(run(&search, query).await, set(&["4"]));

    let keys = KeyScheme::new(search.namespace());
    for key in [keys.field_temp_key("cid"), keys.field_temp_key("content"), keys.final_temp_key()] {
        assert_eq!(search.store().cardinality(&key).await.unwrap(), 0, "{}", key);
    }

    cleanup(&search, &["1", "2", "3", "4", "5"]).await;
}
