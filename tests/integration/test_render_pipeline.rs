//! End-to-end render dispatch: registry gating, instrumentation, and
//! telemetry recording across real and mock adapters.

use std::sync::Arc;
use std::time::Duration;

use multiviz_core::{
    register_builtin_adapters, AdapterRegistry, ChartConfig, ChartRequest, ChartType, Dataset,
    PerformanceMonitor, VizError,
};

use crate::mocks::{datasets, MockAdapter};
use crate::test_setup;

fn registry() -> Arc<AdapterRegistry> {
    Arc::new(AdapterRegistry::new(Arc::new(PerformanceMonitor::default())))
}

fn line_request() -> ChartRequest {
    ChartRequest::new(ChartType::Line, datasets::sales(), ChartConfig::default())
}

#[test]
fn builtin_adapters_render_and_record() {
    test_setup!();
    let registry = registry();
    register_builtin_adapters(&registry).unwrap();

    let artifact = registry.render("echarts", &line_request()).unwrap();
    assert!(artifact.payload.contains("echarts.init"));

    let artifact = registry.render("svg", &line_request()).unwrap();
    assert!(artifact.payload.starts_with("<svg"));

    assert_eq!(registry.monitor().retained(), 2);
    assert_eq!(registry.monitor().aggregate("echarts", None).success_count, 1);
    assert_eq!(registry.monitor().aggregate("svg", None).success_count, 1);
}

#[test]
fn structural_rejections_never_reach_adapter_or_monitor() {
    test_setup!();
    let registry = registry();
    let adapter = MockAdapter::new("mock", &[ChartType::Line]).into_arc();
    registry.register(adapter.clone()).unwrap();

    // Unknown adapter
    let err = registry.render("ghost", &line_request()).unwrap_err();
    assert_eq!(err.category(), "adapter_not_found");

    // Unsupported chart type
    let pie = ChartRequest::new(ChartType::Pie, datasets::sales(), ChartConfig::default());
    let err = registry.render("mock", &pie).unwrap_err();
    assert_eq!(err.category(), "unsupported_chart_type");

    // Empty dataset fails validation
    let empty = ChartRequest::new(ChartType::Line, Dataset::default(), ChartConfig::default());
    let err = registry.render("mock", &empty).unwrap_err();
    assert_eq!(err.category(), "invalid_data");

    assert_eq!(adapter.render_count(), 0);
    assert_eq!(registry.monitor().retained(), 0);
}

#[test]
fn render_failures_are_recorded_with_error_detail() {
    test_setup!();
    let registry = registry();
    registry
        .register(
            MockAdapter::new("broken", &[ChartType::Line])
                .with_failure("upstream renderer crashed")
                .into_arc(),
        )
        .unwrap();

    let err = registry.render("broken", &line_request()).unwrap_err();
    assert!(err.is_recorded());

    let recent = registry.monitor().recent_outcomes(1);
    assert!(!recent[0].success);
    assert!(recent[0]
        .error
        .as_deref()
        .unwrap()
        .contains("upstream renderer crashed"));
    assert_eq!(recent[0].output_bytes, 0);
}

#[test]
fn deadline_overrun_becomes_timeout_failure() {
    test_setup!();
    let registry = registry();
    registry
        .register(
            MockAdapter::new("slow", &[ChartType::Line])
                .with_delay(Duration::from_millis(40))
                .into_arc(),
        )
        .unwrap();

    let err = registry
        .render_with_timeout("slow", &line_request(), Some(Duration::from_millis(5)))
        .unwrap_err();
    assert_eq!(err.category(), "timeout");
    assert!(err.is_recorded());
    assert_eq!(registry.monitor().aggregate("slow", None).failure_count, 1);

    // Without a deadline the same adapter succeeds.
    let artifact = registry.render("slow", &line_request()).unwrap();
    assert!(artifact.metadata.performance.render_time_ms >= 40.0);
}

#[test]
fn fan_out_isolates_failures_per_adapter() {
    test_setup!();
    let registry = registry();
    registry
        .register(MockAdapter::new("good", &[ChartType::Line]).into_arc())
        .unwrap();
    registry
        .register(
            MockAdapter::new("bad", &[ChartType::Line])
                .with_failure("boom")
                .into_arc(),
        )
        .unwrap();
    registry
        .register(MockAdapter::new("unrelated", &[ChartType::Gauge]).into_arc())
        .unwrap();

    let results = registry.render_across_adapters(&line_request(), None);
    assert_eq!(
        results.keys().map(|k| k.as_str()).collect::<Vec<_>>(),
        vec!["bad", "good"],
        "only capable adapters participate, in name order"
    );
    assert!(results["good"].is_ok());
    assert!(matches!(results["bad"], Err(VizError::Render(_))));

    // Both attempts were recorded, success and failure alike.
    assert_eq!(registry.monitor().retained(), 2);
}

#[test]
fn artifact_metadata_carries_performance_figures() {
    test_setup!();
    let registry = registry();
    registry
        .register(
            MockAdapter::new("sized", &[ChartType::Bar])
                .with_payload_bytes(4096)
                .into_arc(),
        )
        .unwrap();

    let request = ChartRequest::new(ChartType::Bar, datasets::sales(), ChartConfig::default());
    let artifact = registry.render("sized", &request).unwrap();

    assert_eq!(artifact.metadata.adapter_name, "sized");
    assert_eq!(artifact.metadata.chart_type, ChartType::Bar);
    assert_eq!(artifact.metadata.performance.output_size, 4096);

    let outcome = &registry.monitor().recent_outcomes(1)[0];
    assert_eq!(outcome.output_bytes, 4096);
    assert_eq!(outcome.data_points, datasets::sales().point_count());
}

#[test]
fn exported_report_parses_and_matches_aggregates() {
    test_setup!();
    let registry = registry();
    register_builtin_adapters(&registry).unwrap();
    registry.render("svg", &line_request()).unwrap();
    registry.render("svg", &line_request()).unwrap();

    let report: serde_json::Value =
        serde_json::from_str(&registry.monitor().export_report().unwrap()).unwrap();
    assert_eq!(report["outcomes_retained"], 2);
    assert_eq!(report["adapters"]["svg"]["count"], 2);
    assert_eq!(report["adapters"]["svg"]["success_count"], 2);
}

#[test]
fn unregistered_adapter_stops_receiving_renders() {
    test_setup!();
    let registry = registry();
    registry
        .register(MockAdapter::new("transient", &[ChartType::Line]).into_arc())
        .unwrap();
    registry.render("transient", &line_request()).unwrap();

    registry.unregister("transient");
    let err = registry.render("transient", &line_request()).unwrap_err();
    assert_eq!(err.category(), "adapter_not_found");

    // History from before the unregister survives.
    assert_eq!(registry.monitor().aggregate("transient", None).count, 1);
}
