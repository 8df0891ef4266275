//! Reference model implementations

mod pixel_stats;

pub use pixel_stats::{PixelStats, PixelStatsConfig};
