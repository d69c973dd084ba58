//! Data models for the returns chart and fragment loaders
//!
//! Plain data carried between services: chart points and layout, the JSON
//! figure consumed by the plotting call, and request outcomes.

pub mod chart;
pub mod figure;
pub mod fragment;

// Re-export commonly used types for convenience
pub use chart::{ChartConfig, ChartFormat, ReturnPoint, ReturnRow, SeriesKind};
pub use figure::{Figure, Trace};
pub use fragment::{FetchOutcome, RequestState};
