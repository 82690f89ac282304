use serde::Deserialize;
use serde_json::Value;

use crate::utils::errors::{bad_request_error, AppResult};

// Request de cancelación: `{id}` o `{ids: [...]}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CancelRequest {
    Many { ids: Vec<i64> },
    One { id: i64 },
}

impl CancelRequest {
    pub fn from_body(body: Value) -> AppResult<Vec<i64>> {
        let request: CancelRequest = serde_json::from_value(body)
            .map_err(|_| bad_request_error("body must be {\"id\": number} or {\"ids\": [number]}"))?;
        let ids = match request {
            CancelRequest::Many { ids } => ids,
            CancelRequest::One { id } => vec![id],
        };
        if ids.is_empty() {
            return Err(bad_request_error("ids must not be empty"));
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cancel_request_shapes() {
        assert_eq!(CancelRequest::from_body(json!({"id": 4})).unwrap(), vec![4]);
        assert_eq!(CancelRequest::from_body(json!({"ids": [4, 9]})).unwrap(), vec![4, 9]);
        assert!(CancelRequest::from_body(json!({"ids": []})).is_err());
        assert!(CancelRequest::from_body(json!({"ids": "4"})).is_err());
    }
}
