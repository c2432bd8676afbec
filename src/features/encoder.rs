//! Feature Encoder - FeatureRecord → model input
//!
//! Pure and total over validated records. The output order is
//! `ENCODED_LAYOUT`; categorical attributes are not encoded.

use super::layout::{layout_hash, ENCODED_FEATURE_COUNT, FEATURE_VERSION};
use super::schema::FeatureRecord;

/// Model input vector with layout metadata
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedVector {
    /// Feature layout version
    pub version: u8,
    /// CRC32 of the layout the values follow
    pub layout_hash: u32,
    /// Values in ENCODED_LAYOUT order
    pub values: [f32; ENCODED_FEATURE_COUNT],
}

impl EncodedVector {
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

pub struct FeatureEncoder;

impl FeatureEncoder {
    /// Encode one validated record
    pub fn encode(record: &FeatureRecord) -> EncodedVector {
        let r = record;
        let values = [
            r.duration as f32,
            r.src_bytes as f32,
            r.dst_bytes as f32,
            r.land as f32,
            r.wrong_fragment as f32,
            r.urgent as f32,
            r.hot as f32,
            r.num_failed_logins as f32,
            r.logged_in as f32,
            r.num_compromised as f32,
            r.root_shell as f32,
            r.su_attempted as f32,
            r.num_root as f32,
            r.num_file_creations as f32,
            r.num_shells as f32,
            r.num_access_files as f32,
            r.num_outbound_cmds as f32,
            r.is_host_login as f32,
            r.is_guest_login as f32,
            r.count as f32,
            r.srv_count as f32,
            r.serror_rate as f32,
            r.srv_serror_rate as f32,
            r.rerror_rate as f32,
            r.srv_rerror_rate as f32,
            r.same_srv_rate as f32,
            r.diff_srv_rate as f32,
            r.srv_diff_host_rate as f32,
            r.dst_host_count as f32,
            r.dst_host_srv_count as f32,
            r.dst_host_same_srv_rate as f32,
            r.dst_host_diff_srv_rate as f32,
            r.dst_host_same_src_port_rate as f32,
            r.dst_host_srv_diff_host_rate as f32,
            r.dst_host_serror_rate as f32,
            r.dst_host_srv_serror_rate as f32,
            r.dst_host_rerror_rate as f32,
            r.dst_host_srv_rerror_rate as f32,
        ];

        EncodedVector {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values,
        }
    }
}
