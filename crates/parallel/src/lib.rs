//! # geomoran Parallel
//!
//! Execution strategies for embarrassingly parallel statistics work.
//!
//! This crate provides:
//! - `ProcessingMode`: sequential, all cores, or a fixed-size worker pool
//! - `ParallelStrategy`: order-preserving index-range map over a chosen mode
//!
//! Without the `parallel` feature every mode runs sequentially.

pub mod strategy;

pub use strategy::{ParallelStrategy, ProcessingMode};
