//! Concurrency properties: no lost telemetry under parallel writers and
//! safe registry mutation while renders are in flight.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use multiviz_core::{
    AdapterRegistry, ChartConfig, ChartRequest, ChartType, MonitorConfig, PerformanceMonitor,
    RenderOutcome,
};

use crate::mocks::{datasets, MockAdapter};
use crate::test_setup;

#[test]
fn hundred_concurrent_records_all_land() {
    test_setup!();
    let monitor = Arc::new(PerformanceMonitor::default());

    let handles: Vec<_> = (0..10)
        .map(|t| {
            let monitor = Arc::clone(&monitor);
            thread::spawn(move || {
                for i in 0..10 {
                    monitor.record(RenderOutcome::success(
                        "echarts",
                        ChartType::Line,
                        100,
                        Duration::from_millis(10 + (t * 10 + i) % 7),
                        2048,
                        4096,
                    ));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = monitor.aggregate("echarts", None);
    assert_eq!(stats.count, 100);
    assert_eq!(stats.success_count, 100);
    assert_eq!(monitor.retained(), 100);
}

#[test]
fn eviction_keeps_buffer_bounded_under_parallel_load() {
    test_setup!();
    let monitor = Arc::new(PerformanceMonitor::new(MonitorConfig {
        history_capacity: 50,
        ..Default::default()
    }));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let monitor = Arc::clone(&monitor);
            thread::spawn(move || {
                for _ in 0..100 {
                    monitor.record(RenderOutcome::success(
                        "svg",
                        ChartType::Bar,
                        10,
                        Duration::from_millis(5),
                        128,
                        256,
                    ));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(monitor.retained(), 50);
    // Lifetime aggregates still count every record.
    assert_eq!(monitor.aggregate("svg", None).count, 400);
}

#[test]
fn concurrent_renders_with_live_registration() {
    test_setup!();
    let registry = Arc::new(AdapterRegistry::new(Arc::new(PerformanceMonitor::default())));
    registry
        .register(MockAdapter::new("steady", &[ChartType::Line]).into_arc())
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let request = ChartRequest::new(
                    ChartType::Line,
                    datasets::random_numeric(50, i),
                    ChartConfig::default(),
                );
                if i % 2 == 0 {
                    let name = format!("dynamic-{}", i);
                    registry
                        .register(MockAdapter::new(&name, &[ChartType::Gauge]).into_arc())
                        .unwrap();
                }
                for _ in 0..10 {
                    registry.render("steady", &request).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(registry.adapter_count(), 5);
    assert_eq!(registry.monitor().aggregate("steady", None).count, 80);
}

#[test]
fn slow_render_does_not_serialize_other_adapters() {
    test_setup!();
    let registry = Arc::new(AdapterRegistry::new(Arc::new(PerformanceMonitor::default())));
    registry
        .register(
            MockAdapter::new("slow", &[ChartType::Line])
                .with_delay(Duration::from_millis(150))
                .into_arc(),
        )
        .unwrap();
    registry
        .register(MockAdapter::new("quick", &[ChartType::Line]).into_arc())
        .unwrap();

    let request = ChartRequest::new(ChartType::Line, datasets::sales(), ChartConfig::default());

    let slow_registry = Arc::clone(&registry);
    let slow_request = request.clone();
    let slow_handle = thread::spawn(move || slow_registry.render("slow", &slow_request).unwrap());

    // While the slow render sleeps, quick renders must complete.
    thread::sleep(Duration::from_millis(20));
    let start = std::time::Instant::now();
    registry.render("quick", &request).unwrap();
    assert!(start.elapsed() < Duration::from_millis(100));

    slow_handle.join().unwrap();
    assert_eq!(registry.monitor().retained(), 2);
}
