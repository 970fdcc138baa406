//! Single-pass reconciliation behavior
//!
//! Verifies the core contract of one pass: a record is written if and only
//! if the discovered address differs (textually) from the authoritative
//! value, absent records are bootstrapped through the sentinel, and one
//! name's failure does not take the rest of the pass down with it.

mod common;

use common::*;
use r53dyndns_core::{Engine, Error, Family};

#[tokio::test]
async fn drift_triggers_exactly_one_update() {
    let resolver = ScriptedResolver::new(Some("203.0.113.5"), None);
    let factory = MockClientFactory::new();
    factory.seed("home.example.com", Family::V4, "203.0.113.1");

    let engine = Engine::new(
        Box::new(resolver.clone()),
        Box::new(factory.clone()),
        test_config(&["home.example.com"], true, false),
    )
    .unwrap();

    engine.run_once().await.unwrap();

    assert_eq!(
        factory.updates("home.example.com"),
        vec![(Some("203.0.113.5".to_string()), None)]
    );
    assert_eq!(resolver.v4_calls(), 1);
    assert_eq!(resolver.v6_calls(), 0, "v6 disabled, must not be resolved");
}

#[tokio::test]
async fn matching_value_makes_no_update() {
    let resolver = ScriptedResolver::new(Some("203.0.113.5"), None);
    let factory = MockClientFactory::new();
    factory.seed("home.example.com", Family::V4, "203.0.113.5");

    let engine = Engine::new(
        Box::new(resolver),
        Box::new(factory.clone()),
        test_config(&["home.example.com"], true, false),
    )
    .unwrap();

    engine.run_once().await.unwrap();

    assert!(factory.updates("home.example.com").is_empty());
}

#[tokio::test]
async fn absent_record_bootstraps_sentinel_then_converges() {
    // First write materializes the record with the v4 sentinel, second write
    // brings it to the discovered address within the same pass.
    let resolver = ScriptedResolver::new(Some("203.0.113.5"), None);
    let factory = MockClientFactory::new();

    let engine = Engine::new(
        Box::new(resolver),
        Box::new(factory.clone()),
        test_config(&["home.example.com"], true, false),
    )
    .unwrap();

    engine.run_once().await.unwrap();

    assert_eq!(
        factory.updates("home.example.com"),
        vec![
            (Some("169.254.0.1".to_string()), None),
            (Some("203.0.113.5".to_string()), None),
        ]
    );
}

#[tokio::test]
async fn v6_discovery_failure_is_not_fatal() {
    let resolver = ScriptedResolver::new(Some("203.0.113.5"), None);
    let factory = MockClientFactory::new();
    factory.seed("home.example.com", Family::V4, "203.0.113.1");
    factory.seed("home.example.com", Family::V6, "2002::1");

    let engine = Engine::new(
        Box::new(resolver.clone()),
        Box::new(factory.clone()),
        test_config(&["home.example.com"], true, true),
    )
    .unwrap();

    engine.run_once().await.unwrap();

    // v4 still reconciled, v6 skipped for this pass
    assert_eq!(
        factory.updates("home.example.com"),
        vec![(Some("203.0.113.5".to_string()), None)]
    );
    assert_eq!(resolver.v6_calls(), 1);
}

#[tokio::test]
async fn v4_discovery_failure_fails_the_pass() {
    let resolver = ScriptedResolver::new(None, None);
    let factory = MockClientFactory::new();

    let engine = Engine::new(
        Box::new(resolver),
        Box::new(factory.clone()),
        test_config(&["home.example.com"], true, false),
    )
    .unwrap();

    let result = engine.run_once().await;
    assert!(matches!(result, Err(Error::LookupFailed { .. })));
    assert!(factory.updates("home.example.com").is_empty());
}

#[tokio::test]
async fn one_name_failure_does_not_abort_others() {
    let resolver = ScriptedResolver::new(Some("203.0.113.5"), None);
    let factory = MockClientFactory::new();
    factory.fail_reads("broken.example.com");
    factory.seed("home.example.com", Family::V4, "203.0.113.1");

    let engine = Engine::new(
        Box::new(resolver),
        Box::new(factory.clone()),
        test_config(&["broken.example.com", "home.example.com"], true, false),
    )
    .unwrap();

    // The pass fails overall but the healthy name was still reconciled.
    let result = engine.run_once().await;
    assert!(matches!(result, Err(Error::RecordReadFailed { .. })));
    assert_eq!(
        factory.updates("home.example.com"),
        vec![(Some("203.0.113.5".to_string()), None)]
    );
}

#[tokio::test]
async fn ipv6_comparison_is_textual() {
    // Equivalent addresses in different textual forms count as drift; the
    // comparison applies no canonicalization.
    let resolver = ScriptedResolver::new(None, Some("2002::1"));
    let factory = MockClientFactory::new();
    factory.seed("home.example.com", Family::V6, "2002:0:0:0:0:0:0:1");

    let engine = Engine::new(
        Box::new(resolver),
        Box::new(factory.clone()),
        test_config(&["home.example.com"], false, true),
    )
    .unwrap();

    engine.run_once().await.unwrap();

    assert_eq!(
        factory.updates("home.example.com"),
        vec![(None, Some("2002::1".to_string()))]
    );
}

#[tokio::test]
async fn dual_stack_pass_updates_both_families() {
    let resolver = ScriptedResolver::new(Some("203.0.113.5"), Some("2002::1"));
    let factory = MockClientFactory::new();
    factory.seed("home.example.com", Family::V4, "203.0.113.1");
    factory.seed("home.example.com", Family::V6, "2002::99");

    let engine = Engine::new(
        Box::new(resolver),
        Box::new(factory.clone()),
        test_config(&["home.example.com"], true, true),
    )
    .unwrap();

    engine.run_once().await.unwrap();

    assert_eq!(
        factory.updates("home.example.com"),
        vec![
            (Some("203.0.113.5".to_string()), None),
            (None, Some("2002::1".to_string())),
        ]
    );
}
