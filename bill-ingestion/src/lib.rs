pub mod pipeline;
pub mod config;
pub mod sources;
pub mod sinks;
pub mod transform;
pub mod observability;
pub mod extract;
pub mod weather;
pub mod enrich;
pub mod dashboard;
pub mod stages;
pub mod report;

pub use pipeline::{Envelope, Pipeline};
