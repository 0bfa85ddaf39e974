//! Core data structures for dated time series.

mod time_series;

pub use time_series::TimeSeries;
