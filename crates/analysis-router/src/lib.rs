//! Core library for routing map-and-chat queries to
//! geographic analysis endpoints and normalizing their records for rendering.

pub mod classifier;
pub mod cross_reference;
pub mod fetch;
pub mod normalize;
pub mod quantile;
pub mod registry;
pub mod router;
pub mod signals;
pub mod types;

pub use classifier::QueryClassifier;
pub use cross_reference::CrossReferenceDetector;
pub use fetch::{parse_dataset, DatasetFetcher, MemoryFetcher};
pub use normalize::RecordNormalizer;
pub use quantile::{
    classify, compute_breaks, legend, ClassificationBreaks, LegendEntry, DEFAULT_BUCKET_COUNT,
};
pub use registry::{EndpointRegistry, EndpointSignature, Priority, BUILTIN_DEFAULT_ENDPOINT};
pub use router::AnalysisRouter;
pub use types::*;
