use serde::{Deserialize, Serialize};

/// Structured information about a single medicine, assembled from a
/// free-form AI response. Immutable once constructed; duplicates are
/// possible and not deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineInfo {
    pub name: String,
    pub usage: String,
    pub dosage: String,
    pub side_effects: String,
    pub precautions: String,
}
