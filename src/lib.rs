//! Leadscope: lead quality analysis library
//!
//! Cleans a lead-generation dataset, derives outcome flags and contactability
//! buckets, aggregates quality by segment and ranks the predictors of a good
//! lead with a random forest.

pub mod cli;
pub mod pipeline;
pub mod render;
pub mod report;
pub mod utils;
