//! End-to-end recommendation scenarios: telemetry accumulated through
//! real registry renders feeding the scoring engine.

use std::sync::Arc;
use std::time::Duration;

use multiviz_core::{
    AdapterRegistry, ChartConfig, ChartRequest, ChartType, Criterion, PerformanceMonitor,
    RecommendationEngine, ScoringConfig,
};

use crate::mocks::{datasets, MockAdapter};
use crate::test_setup;

fn line_request() -> ChartRequest {
    ChartRequest::new(ChartType::Line, datasets::sales(), ChartConfig::default())
}

/// A fast lean adapter and a slow heavyweight one, both exercised
/// through the real render path.
fn fast_vs_rich() -> (Arc<AdapterRegistry>, RecommendationEngine) {
    let registry = Arc::new(AdapterRegistry::new(Arc::new(PerformanceMonitor::default())));
    registry
        .register(
            MockAdapter::new("fast", &[ChartType::Line, ChartType::Bar])
                .with_delay(Duration::from_millis(5))
                .with_payload_bytes(512)
                .into_arc(),
        )
        .unwrap();
    registry
        .register(
            MockAdapter::new("rich", &[ChartType::Line, ChartType::Pie])
                .with_delay(Duration::from_millis(60))
                .with_payload_bytes(64 * 1024)
                .with_features(&["interactive output"])
                .into_arc(),
        )
        .unwrap();

    for _ in 0..5 {
        registry.render("fast", &line_request()).unwrap();
        registry.render("rich", &line_request()).unwrap();
    }

    let engine = RecommendationEngine::new(Arc::clone(&registry), ScoringConfig::default());
    (registry, engine)
}

#[test]
fn faster_leaner_adapter_wins_for_shared_chart_type() {
    test_setup!();
    let (_registry, engine) = fast_vs_rich();

    let recs = engine.recommend(ChartType::Line);
    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0].adapter, "fast");
    assert!(recs[0].score > recs[1].score);
    assert!(recs
        .iter()
        .all(|r| (0.0..=10.0).contains(&r.score)));
}

#[test]
fn exclusive_chart_type_goes_to_its_only_adapter() {
    test_setup!();
    let (_registry, engine) = fast_vs_rich();

    let recs = engine.recommend(ChartType::Pie);
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].adapter, "rich");
}

#[test]
fn recommendations_are_deterministic_across_calls() {
    test_setup!();
    let (_registry, engine) = fast_vs_rich();

    let first = engine.recommend(ChartType::Line);
    for _ in 0..5 {
        assert_eq!(engine.recommend(ChartType::Line), first);
    }
}

#[test]
fn unknown_chart_type_yields_empty_ranking() {
    test_setup!();
    let (_registry, engine) = fast_vs_rich();
    assert!(engine.recommend(ChartType::Heatmap).is_empty());
}

#[test]
fn adapter_without_history_scores_neutral_baseline() {
    test_setup!();
    let (registry, engine) = fast_vs_rich();
    registry
        .register(MockAdapter::new("newcomer", &[ChartType::Line]).into_arc())
        .unwrap();

    let recs = engine.recommend(ChartType::Line);
    let newcomer = recs.iter().find(|r| r.adapter == "newcomer").unwrap();
    assert!((newcomer.score - 5.0).abs() < 1e-9);
    assert_eq!(newcomer.reasons[0], "no recorded telemetry yet");
}

#[test]
fn failing_adapter_ranks_below_reliable_one() {
    test_setup!();
    let registry = Arc::new(AdapterRegistry::new(Arc::new(PerformanceMonitor::default())));
    registry
        .register(MockAdapter::new("solid", &[ChartType::Bar]).into_arc())
        .unwrap();
    registry
        .register(
            MockAdapter::new("flaky", &[ChartType::Bar])
                .with_failure("intermittent")
                .into_arc(),
        )
        .unwrap();

    let request = ChartRequest::new(ChartType::Bar, datasets::sales(), ChartConfig::default());
    for _ in 0..4 {
        registry.render("solid", &request).unwrap();
        let _ = registry.render("flaky", &request);
    }

    let engine = RecommendationEngine::new(Arc::clone(&registry), ScoringConfig::default());
    let recs = engine.recommend(ChartType::Bar);
    assert_eq!(recs[0].adapter, "solid");
    assert!(recs[1].score < recs[0].score);
}

#[test]
fn best_for_picks_per_criterion_winners() {
    test_setup!();
    let (_registry, engine) = fast_vs_rich();

    assert_eq!(
        engine.best_for(ChartType::Line, Criterion::Speed).as_deref(),
        Some("fast")
    );
    assert_eq!(
        engine
            .best_for(ChartType::Line, Criterion::Footprint)
            .as_deref(),
        Some("fast")
    );
    // Pie telemetry exists only for "rich".
    assert_eq!(
        engine.best_for(ChartType::Pie, Criterion::Speed).as_deref(),
        Some("rich")
    );
    assert!(engine
        .best_for(ChartType::Heatmap, Criterion::Speed)
        .is_none());
}
