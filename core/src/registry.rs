//! Adapter registry and instrumented render dispatch
//!
//! The registry is the single point of truth mapping adapter names to
//! instances. It enforces the adapter contract before any render attempt,
//! wraps every render with timing and memory instrumentation, and
//! forwards the outcome to the performance monitor unconditionally, on
//! success and on failure alike.
//!
//! The name map is read-mostly after startup. Registration and metric
//! recording are short critical sections; the render call itself happens
//! outside any lock so one slow render never blocks other callers.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use sysinfo::{Pid, System};
use tracing::{error, info, warn};

use crate::adapter::{AdapterDescriptor, ChartAdapter};
use crate::chart::{ChartRequest, ChartType, RenderedArtifact};
use crate::config::RenderConfig;
use crate::error::{RegistryError, RegistryResult, RenderError, Result};
use crate::monitor::{PerformanceMonitor, RenderOutcome};

/// Process RSS sampler used to attribute memory cost to renders
struct MemoryProbe {
    system: Mutex<System>,
    pid: Option<Pid>,
}

impl MemoryProbe {
    fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
            pid: sysinfo::get_current_pid().ok(),
        }
    }

    /// Current process RSS in bytes; 0 when the process cannot be probed
    fn rss(&self) -> u64 {
        let Some(pid) = self.pid else { return 0 };
        let mut system = match self.system.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !system.refresh_process(pid) {
            return 0;
        }
        system.process(pid).map(|p| p.memory()).unwrap_or(0)
    }
}

/// Named adapter instances plus instrumented dispatch.
///
/// Registration after startup is synchronized against concurrent renders
/// reading the map; renders to different adapters proceed independently.
pub struct AdapterRegistry {
    adapters: RwLock<HashMap<String, Arc<dyn ChartAdapter>>>,
    monitor: Arc<PerformanceMonitor>,
    default_timeout: Option<Duration>,
    probe: MemoryProbe,
}

impl AdapterRegistry {
    pub fn new(monitor: Arc<PerformanceMonitor>) -> Self {
        Self::with_render_config(monitor, &RenderConfig::default())
    }

    pub fn with_render_config(monitor: Arc<PerformanceMonitor>, render: &RenderConfig) -> Self {
        Self {
            adapters: RwLock::new(HashMap::new()),
            monitor,
            default_timeout: render.default_timeout(),
            probe: MemoryProbe::new(),
        }
    }

    /// The monitor this registry records outcomes into
    pub fn monitor(&self) -> &Arc<PerformanceMonitor> {
        &self.monitor
    }

    /// Register an adapter under its own name.
    ///
    /// Names are case-sensitive and unique per registry instance.
    pub fn register(&self, adapter: Arc<dyn ChartAdapter>) -> RegistryResult<()> {
        let name = adapter.name().to_string();
        let mut adapters = self.write_lock();
        if adapters.contains_key(&name) {
            return Err(RegistryError::DuplicateAdapter { name });
        }
        info!(adapter = %name, "registered adapter");
        adapters.insert(name, adapter);
        Ok(())
    }

    /// Remove an adapter; safe to call for names that were never registered
    pub fn unregister(&self, name: &str) {
        if self.write_lock().remove(name).is_some() {
            info!(adapter = %name, "unregistered adapter");
        }
    }

    pub fn get(&self, name: &str) -> RegistryResult<Arc<dyn ChartAdapter>> {
        self.read_lock()
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::AdapterNotFound {
                name: name.to_string(),
            })
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.read_lock().contains_key(name)
    }

    pub fn adapter_count(&self) -> usize {
        self.read_lock().len()
    }

    /// Descriptors of all registered adapters, sorted by name
    pub fn list_adapters(&self) -> Vec<AdapterDescriptor> {
        let mut descriptors: Vec<AdapterDescriptor> = self
            .read_lock()
            .values()
            .map(|a| a.descriptor())
            .collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// Supported chart types, for one adapter or for all of them
    pub fn supported_chart_types(
        &self,
        adapter: Option<&str>,
    ) -> RegistryResult<BTreeMap<String, Vec<ChartType>>> {
        let mut map = BTreeMap::new();
        match adapter {
            Some(name) => {
                let adapter = self.get(name)?;
                map.insert(name.to_string(), sorted_chart_types(adapter.as_ref()));
            }
            None => {
                for (name, adapter) in self.read_lock().iter() {
                    map.insert(name.clone(), sorted_chart_types(adapter.as_ref()));
                }
            }
        }
        Ok(map)
    }

    /// Render with the registry's default deadline
    pub fn render(&self, adapter_name: &str, request: &ChartRequest) -> Result<RenderedArtifact> {
        self.render_with_timeout(adapter_name, request, self.default_timeout)
    }

    /// Render with an explicit deadline.
    ///
    /// Contract violations (unknown adapter, unsupported type, invalid
    /// data) return before the adapter is invoked and are never recorded
    /// as telemetry. Once the adapter runs, an outcome is recorded no
    /// matter how the render ends.
    pub fn render_with_timeout(
        &self,
        adapter_name: &str,
        request: &ChartRequest,
        timeout: Option<Duration>,
    ) -> Result<RenderedArtifact> {
        let adapter = self.get(adapter_name)?;
        let chart_type = request.chart_type;

        if !adapter.supported_chart_types().contains(&chart_type) {
            return Err(RenderError::UnsupportedChartType {
                adapter: adapter_name.to_string(),
                chart_type,
            }
            .into());
        }

        if !adapter.validate_data(chart_type, &request.data) {
            warn!(adapter = %adapter_name, chart_type = %chart_type, "data failed structural validation");
            return Err(RenderError::InvalidData {
                chart_type,
                reason: format!("rejected by adapter '{}'", adapter_name),
            }
            .into());
        }

        let data_points = request.data.point_count();
        let memory_before = self.probe.rss();
        let start = Instant::now();
        let deadline = timeout.map(|t| start + t);

        // The actual render runs outside every registry lock.
        let rendered = adapter.render(request, deadline);

        let elapsed = start.elapsed();
        let memory_delta = self.probe.rss().saturating_sub(memory_before);

        match rendered {
            Ok(mut artifact) => {
                if let Some(limit) = timeout {
                    if elapsed > limit {
                        let err = RenderError::Timeout {
                            adapter: adapter_name.to_string(),
                            elapsed_ms: elapsed.as_millis() as u64,
                            limit_ms: limit.as_millis() as u64,
                        };
                        self.monitor.record(RenderOutcome::failure(
                            adapter_name,
                            chart_type,
                            data_points,
                            elapsed,
                            memory_delta,
                            err.to_string(),
                        ));
                        error!(adapter = %adapter_name, chart_type = %chart_type,
                               elapsed_ms = elapsed.as_millis() as u64, "render exceeded deadline");
                        return Err(err.into());
                    }
                }

                artifact.metadata.adapter_name = adapter_name.to_string();
                artifact.metadata.chart_type = chart_type;
                artifact.metadata.performance.render_time_ms = elapsed.as_secs_f64() * 1000.0;
                artifact.metadata.performance.memory_usage = memory_delta;
                artifact.metadata.performance.output_size = artifact.output_size();

                self.monitor.record(RenderOutcome::success(
                    adapter_name,
                    chart_type,
                    data_points,
                    elapsed,
                    memory_delta,
                    artifact.output_size(),
                ));
                Ok(artifact)
            }
            Err(err) => {
                self.monitor.record(RenderOutcome::failure(
                    adapter_name,
                    chart_type,
                    data_points,
                    elapsed,
                    memory_delta,
                    err.to_string(),
                ));
                error!(adapter = %adapter_name, chart_type = %chart_type, error = %err, "render failed");
                Err(err.into())
            }
        }
    }

    /// Fan-out render across adapters for side-by-side comparison.
    ///
    /// When `adapter_names` is omitted, every registered adapter that
    /// supports the chart type is tried. Each adapter is invoked
    /// independently; one failure never aborts the others, and the caller
    /// receives a per-adapter result map.
    pub fn render_across_adapters(
        &self,
        request: &ChartRequest,
        adapter_names: Option<&[String]>,
    ) -> BTreeMap<String, Result<RenderedArtifact>> {
        let candidates: Vec<String> = match adapter_names {
            Some(names) => names.to_vec(),
            None => {
                let adapters = self.read_lock();
                let mut names: Vec<String> = adapters
                    .iter()
                    .filter(|(_, a)| a.supported_chart_types().contains(&request.chart_type))
                    .map(|(name, _)| name.clone())
                    .collect();
                names.sort();
                names
            }
        };

        candidates
            .into_iter()
            .map(|name| {
                let result = self.render(&name, request);
                (name, result)
            })
            .collect()
    }

    fn read_lock(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<dyn ChartAdapter>>> {
        match self.adapters.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_lock(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<dyn ChartAdapter>>> {
        match self.adapters.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn sorted_chart_types(adapter: &dyn ChartAdapter) -> Vec<ChartType> {
    let mut types: Vec<ChartType> = adapter.supported_chart_types().into_iter().collect();
    types.sort_by_key(|ct| ct.as_str());
    types
}
