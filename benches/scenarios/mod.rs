//! Real-world scenario benchmarks.
//!
//! These render the graph a playing session builds, through the same
//! context and renderer the device callback uses.

mod graph;

pub use graph::bench_graph;
