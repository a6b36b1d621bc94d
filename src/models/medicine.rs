//! Catalog projections returned by medicine search.

use serde::{Deserialize, Serialize};

/// Read-only projection of one catalog entry.
///
/// Copied by value into prescription lines; never mutated by the client.
/// Unit prices are computed server-side and informational only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicineSummary {
    #[serde(rename = "id")]
    pub catalog_id: String,
    pub name: String,
    #[serde(rename = "price")]
    pub unit_price: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_wire_field_names() {
        let json = r#"{"id":"med-42","name":"Aspirin 100mg","price":12.5}"#;
        let summary: MedicineSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.catalog_id, "med-42");
        assert_eq!(summary.name, "Aspirin 100mg");
        assert_eq!(summary.unit_price, 12.5);
    }

    #[test]
    fn serializes_back_to_wire_field_names() {
        let summary = MedicineSummary {
            catalog_id: "med-1".into(),
            name: "Parol".into(),
            unit_price: 3.0,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("id").is_some());
        assert!(json.get("price").is_some());
        assert!(json.get("catalog_id").is_none());
    }
}
