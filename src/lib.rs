//! Ensemble resampling and quantile aggregation for simulation summary
//! histories.
//!
//! An ensemble of summary cases is loaded from glob patterns, resampled onto
//! a shared, evenly spaced time axis spanning the union of the cases' native
//! ranges, and reduced to empirical quantiles per (timestep, variable,
//! level). Results are written as PLAIN, HEADER or S3GRAPH text tables.

pub mod config;
pub mod ensemble;
pub mod quantile;
pub mod report;
pub mod resample;
pub mod summary;
