use crate::datamodel::Label;
use sha2::{Digest, Sha256};

/// Identity of a timeseries: SHA-256 over each label's name and value bytes,
/// in the order the labels were parsed, hex encoded.
///
/// The hash is order-sensitive. The same labels in a different order are a
/// different series.
pub fn timeseries_hash(labels: &[Label]) -> String {
    let mut hasher = Sha256::new();
    for label in labels {
        hasher.update(label.name.as_bytes());
        hasher.update(label.value.as_bytes());
    }
    hex::encode(hasher.finalize())
}
