pub mod classify;
pub mod config;
pub mod debug;
pub mod detection;
pub mod models;
pub mod pipeline;

pub use classify::{ClassifierRegistry, DetectionParams, RegionClassifier, SignDetection, classify_proposals};
pub use config::{ChannelMode, PreprocessConfig, ProposalConfig, ShapeConfig};
pub use debug::DebugDump;
pub use detection::shapes::{Classification, ContourClassifier, Rejection};
pub use detection::{ChannelPreprocessor, ProposalExtractor};
pub use models::{BoundingBox, Contour, Point, ProposalSet, ShapeLabel};
pub use pipeline::{NoopObserver, Pipeline, PipelineObserver, PipelineStep, ProposalCallback};
