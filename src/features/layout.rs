//! Feature Layout - Centralized Feature Definition
//!
//! **CRITICAL: This file controls the feature schema**
//!
//! ## Rules (NEVER break these):
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION
//!
//! The encoded order must match the column order the model artifact was
//! trained on. A mismatch does not error at inference time, it misclassifies.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
/// MUST be incremented when layout changes
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE KINDS
// ============================================================================

/// How a raw attribute is typed and constrained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// Any finite number
    Continuous,
    /// Free-form string, not encoded
    Categorical,
    /// Integer >= 0
    Count,
    /// Integer in {0, 1}
    Binary,
    /// Float in [0, 1]
    Rate,
}

impl FeatureKind {
    pub fn is_integer(self) -> bool {
        matches!(self, FeatureKind::Count | FeatureKind::Binary)
    }

    pub fn is_encoded(self) -> bool {
        self != FeatureKind::Categorical
    }

    /// Human readable constraint, used in validation messages
    pub fn constraint(self) -> &'static str {
        match self {
            FeatureKind::Continuous => "must be a finite number",
            FeatureKind::Categorical => "must be a string",
            FeatureKind::Count => "must be an integer >= 0",
            FeatureKind::Binary => "must be 0 or 1",
            FeatureKind::Rate => "must be a number between 0 and 1",
        }
    }
}

/// One named attribute of a feature record
#[derive(Debug, Clone, Copy)]
pub struct FeatureSpec {
    pub name: &'static str,
    pub kind: FeatureKind,
}

const fn spec(name: &'static str, kind: FeatureKind) -> FeatureSpec {
    FeatureSpec { name, kind }
}

use FeatureKind::{Binary, Categorical, Continuous, Count, Rate};

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// All request attributes, in NSL-KDD column order.
/// This is the SINGLE SOURCE OF TRUTH for feature layout
pub const FEATURE_LAYOUT: &[FeatureSpec] = &[
    // === Basic connection (0-9) ===
    spec("duration", Continuous),
    spec("protocol_type", Categorical),
    spec("service", Categorical),
    spec("flag", Categorical),
    spec("src_bytes", Count),
    spec("dst_bytes", Count),
    spec("land", Binary),
    spec("wrong_fragment", Count),
    spec("urgent", Count),
    spec("hot", Count),

    // === Content (10-21) ===
    spec("num_failed_logins", Count),
    spec("logged_in", Binary),
    spec("num_compromised", Count),
    spec("root_shell", Binary),
    spec("su_attempted", Binary),
    spec("num_root", Count),
    spec("num_file_creations", Count),
    spec("num_shells", Count),
    spec("num_access_files", Count),
    spec("num_outbound_cmds", Count),
    spec("is_host_login", Binary),
    spec("is_guest_login", Binary),

    // === Time-based traffic, 2 second window (22-30) ===
    spec("count", Count),
    spec("srv_count", Count),
    spec("serror_rate", Rate),
    spec("srv_serror_rate", Rate),
    spec("rerror_rate", Rate),
    spec("srv_rerror_rate", Rate),
    spec("same_srv_rate", Rate),
    spec("diff_srv_rate", Rate),
    spec("srv_diff_host_rate", Rate),

    // === Host-based traffic (31-40) ===
    spec("dst_host_count", Count),
    spec("dst_host_srv_count", Count),
    spec("dst_host_same_srv_rate", Rate),
    spec("dst_host_diff_srv_rate", Rate),
    spec("dst_host_same_src_port_rate", Rate),
    spec("dst_host_srv_diff_host_rate", Rate),
    spec("dst_host_serror_rate", Rate),
    spec("dst_host_srv_serror_rate", Rate),
    spec("dst_host_rerror_rate", Rate),
    spec("dst_host_srv_rerror_rate", Rate),
];

/// Total number of request attributes
/// IMPORTANT: Must match FEATURE_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 41;

/// Names of the model input columns, in order.
/// FEATURE_LAYOUT minus the categorical attributes.
pub const ENCODED_LAYOUT: &[&str] = &[
    "duration",
    "src_bytes",
    "dst_bytes",
    "land",
    "wrong_fragment",
    "urgent",
    "hot",
    "num_failed_logins",
    "logged_in",
    "num_compromised",
    "root_shell",
    "su_attempted",
    "num_root",
    "num_file_creations",
    "num_shells",
    "num_access_files",
    "num_outbound_cmds",
    "is_host_login",
    "is_guest_login",
    "count",
    "srv_count",
    "serror_rate",
    "srv_serror_rate",
    "rerror_rate",
    "srv_rerror_rate",
    "same_srv_rate",
    "diff_srv_rate",
    "srv_diff_host_rate",
    "dst_host_count",
    "dst_host_srv_count",
    "dst_host_same_srv_rate",
    "dst_host_diff_srv_rate",
    "dst_host_same_src_port_rate",
    "dst_host_srv_diff_host_rate",
    "dst_host_serror_rate",
    "dst_host_srv_serror_rate",
    "dst_host_rerror_rate",
    "dst_host_srv_rerror_rate",
];

/// Width of the model input vector
/// IMPORTANT: Must match ENCODED_LAYOUT.len()!
pub const ENCODED_FEATURE_COUNT: usize = 38;

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 of the encoded layout, used to detect artifact/encoder drift
pub fn layout_hash() -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[FEATURE_VERSION]);

    for name in ENCODED_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }

    hasher.finalize()
}

/// Complete layout information for serialization/logging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub input_count: usize,
    pub encoded_count: usize,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            input_count: FEATURE_COUNT,
            encoded_count: ENCODED_FEATURE_COUNT,
        }
    }
}

// ============================================================================
// LOOKUP
// ============================================================================

pub fn feature_spec(name: &str) -> Option<&'static FeatureSpec> {
    FEATURE_LAYOUT.iter().find(|s| s.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_counts() {
        assert_eq!(FEATURE_LAYOUT.len(), FEATURE_COUNT);
        assert_eq!(ENCODED_LAYOUT.len(), ENCODED_FEATURE_COUNT);
    }

    #[test]
    fn test_encoded_layout_is_non_categorical_subsequence() {
        let derived: Vec<&str> = FEATURE_LAYOUT
            .iter()
            .filter(|s| s.kind.is_encoded())
            .map(|s| s.name)
            .collect();
        assert_eq!(derived, ENCODED_LAYOUT);
    }

    #[test]
    fn test_kind_totals() {
        let count = |k: FeatureKind| FEATURE_LAYOUT.iter().filter(|s| s.kind == k).count();
        assert_eq!(count(Categorical), 3);
        assert_eq!(count(Binary), 6);
        assert_eq!(count(Rate), 15);
        assert_eq!(count(Count), 16);
        assert_eq!(count(Continuous), 1);
    }

    #[test]
    fn test_layout_hash_stable() {
        assert_eq!(layout_hash(), layout_hash());
        assert_ne!(layout_hash(), 0);
    }

    #[test]
    fn test_lookup() {
        assert_eq!(ENCODED_LAYOUT.first(), Some(&"duration"));
        assert_eq!(ENCODED_LAYOUT.last(), Some(&"dst_host_srv_rerror_rate"));
        assert_eq!(feature_spec("land").map(|s| s.kind), Some(Binary));
        assert!(feature_spec("nonexistent").is_none());
    }
}
