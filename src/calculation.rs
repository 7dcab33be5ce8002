pub mod extract;
pub mod latest;
pub mod maker_metrics;
pub mod monthly;
pub mod report;
