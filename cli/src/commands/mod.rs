pub mod adapters;
pub mod charts;
pub mod compare;
pub mod recommend;
pub mod render;
pub mod stats;
pub mod trend;

pub use adapters::AdaptersArgs;
pub use charts::ChartsArgs;
pub use compare::CompareArgs;
pub use recommend::RecommendArgs;
pub use render::RenderArgs;
pub use stats::StatsArgs;
pub use trend::TrendArgs;
