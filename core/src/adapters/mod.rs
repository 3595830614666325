//! Built-in rendering back-ends
//!
//! Two adapters ship with the framework: an ECharts back-end producing
//! self-contained interactive HTML, and a dependency-free SVG back-end
//! for static output. Both register through [`register_builtin_adapters`]
//! so embedders start with a working registry in one call.

use std::sync::Arc;

use tracing::info;

use crate::error::RegistryResult;
use crate::registry::AdapterRegistry;

pub mod echarts;
pub mod svg;

pub use echarts::EChartsAdapter;
pub use svg::SvgAdapter;

/// Register the built-in adapters on a registry.
///
/// Fails with a duplicate-name error if either adapter is already
/// registered, so call it once per registry.
pub fn register_builtin_adapters(registry: &AdapterRegistry) -> RegistryResult<()> {
    registry.register(Arc::new(EChartsAdapter::new()))?;
    registry.register(Arc::new(SvgAdapter::new()))?;
    info!(count = 2, "registered built-in adapters");
    Ok(())
}
