//! End-to-end scenarios for the policy gateway over the mock cache.

use std::sync::Arc;

use cachewarden_core::mocks::MockCacheService;
use cachewarden_core::{BlockCategory, CacheService, SearchOutcome, StoreOutcome};
use cachewarden_gateway::PolicyGateway;

#[tokio::test]
async fn calendar_query_is_blocked_and_redis_query_is_not() {
    let mock = Arc::new(MockCacheService::new());
    let gateway = PolicyGateway::new(Arc::clone(&mock) as Arc<dyn CacheService>);

    let verdict = gateway.check("What's on my calendar today?");
    assert_eq!(verdict.category, Some(BlockCategory::Temporal));

    let verdict = gateway.check("What is Redis?");
    assert!(!verdict.blocked);

    // check is classification only.
    assert_eq!(mock.call_counts().total(), 0);
}

#[tokio::test]
async fn stored_answer_is_found_by_a_paraphrase_free_lookup() {
    let mock = Arc::new(MockCacheService::new());
    let gateway = PolicyGateway::new(Arc::clone(&mock) as Arc<dyn CacheService>);

    let stored = gateway
        .store("What is Redis?", "An in-memory data store.", None)
        .await
        .unwrap();
    assert!(matches!(stored, StoreOutcome::Stored { .. }));

    // Case differences do not matter to the similarity index.
    let outcome = gateway
        .search("what is redis", Some(0.9), None)
        .await
        .unwrap();
    match outcome {
        SearchOutcome::Completed { matches, .. } => {
            assert!(!matches.is_empty());
            assert_eq!(matches[0].entry.response, "An in-memory data store.");
        }
        other => panic!("expected completion, got {other:?}"),
    }
}

#[tokio::test]
async fn sensitive_traffic_never_produces_network_calls() {
    let mock = Arc::new(MockCacheService::new());
    let gateway = PolicyGateway::new(Arc::clone(&mock) as Arc<dyn CacheService>);

    let queries = [
        "user@example.com",
        "api_key=sk-abc123def456",
        "remind me tomorrow",
        "my wife said we should move",
    ];
    for query in queries {
        let outcome = gateway.search(query, None, None).await.unwrap();
        assert!(
            matches!(outcome, SearchOutcome::Blocked { .. }),
            "expected block for {query:?}"
        );
        let outcome = gateway.store(query, "any response", None).await.unwrap();
        assert!(
            matches!(outcome, StoreOutcome::Blocked { .. }),
            "expected block for {query:?}"
        );
    }

    assert_eq!(mock.call_counts().total(), 0);
    assert!(mock.is_empty());
}

#[tokio::test]
async fn expected_block_categories_for_canonical_inputs() {
    let mock = Arc::new(MockCacheService::new());
    let gateway = PolicyGateway::new(mock as Arc<dyn CacheService>);

    let cases = [
        ("user@example.com", BlockCategory::Identifier),
        ("api_key=sk-abc123def456", BlockCategory::Credential),
        ("remind me tomorrow", BlockCategory::Temporal),
        ("my wife said we should move", BlockCategory::PersonalContext),
    ];
    for (text, expected) in cases {
        let verdict = gateway.check(text);
        assert_eq!(verdict.category, Some(expected), "for {text:?}");
    }
}
