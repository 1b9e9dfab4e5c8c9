//! Transport payload between the server and client render passes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One field's query descriptor paired with its response data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldResult {
    /// Engine-serializable query descriptor.
    pub query: Value,
    /// Raw response payload for the query.
    pub data: Value,
}

/// Results for one query set, keyed by logical field name.
pub type ServerResult = BTreeMap<String, FieldResult>;

/// Results for every query set discovered during server rendering.
///
/// Order is discovery order; it carries no meaning but is preserved through
/// serialization for reproducibility.
pub type ServerData = Vec<ServerResult>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_server_data_round_trips_through_json() {
        let mut result = ServerResult::new();
        result.insert(
            "user".to_string(),
            FieldResult {
                query: json!({"field": "user", "variables": {"userId": "user1"}}),
                data: json!({"user": {"username": "myusername"}}),
            },
        );
        let data: ServerData = vec![result];

        let wire = serde_json::to_string(&data).expect("serialize");
        let back: ServerData = serde_json::from_str(&wire).expect("deserialize");
        assert_eq!(back, data);
    }
}
