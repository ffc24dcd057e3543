// Domain layer - Data models and pure series math
pub mod chart;
pub mod metric;
pub mod phase;
pub mod series;
pub mod session;
pub mod smoothing;
pub mod video;
