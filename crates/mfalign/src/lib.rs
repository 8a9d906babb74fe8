pub mod graph;
pub mod grouping;
pub mod index;
pub mod scoring;
pub mod stats;
