#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from signspot for tests
pub use signspot::{BoundingBox, ProposalConfig, ProposalExtractor, ProposalSet, ShapeLabel};
