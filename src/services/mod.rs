//! 业务能力层
//!
//! 每个服务只提供一种能力，不关心行的遍历顺序和写回。

pub mod artifact_capture;
pub mod jurisdiction_resolver;
pub mod primary_lookup;
pub mod result_classifier;
pub mod secondary_lookup;

pub use artifact_capture::ArtifactCapture;
pub use primary_lookup::{LookupReport, PrimaryLookup};
pub use result_classifier::{ClassifiedLocation, ResultClassifier};
pub use secondary_lookup::SecondaryLookup;
