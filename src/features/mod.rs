//! Features Module - request schema and model input encoding
//!
//! raw JSON → `FeatureSchema` → `FeatureRecord` → `FeatureEncoder` → `EncodedVector`

pub mod layout;
pub mod schema;
pub mod encoder;

// Re-export common types
pub use layout::{LayoutInfo, ENCODED_FEATURE_COUNT, FEATURE_COUNT};
pub use schema::{FeatureRecord, FeatureSchema, FieldViolation, ValidationError, ViolationKind};
pub use encoder::{EncodedVector, FeatureEncoder};
