//! Operator input handling

pub mod aggregator;

pub use aggregator::InputAggregator;
