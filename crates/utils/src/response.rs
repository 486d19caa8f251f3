use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Envelope every API response is wrapped in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.to_string()),
        }
    }

    /// A failure that still carries structured details, e.g. the offending ids.
    pub fn error_with_data(data: T, message: &str) -> Self {
        Self {
            success: false,
            data: Some(data),
            message: Some(message.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn envelope_shape() {
        let ok = serde_json::to_value(ApiResponse::success(vec![1, 2])).unwrap();
        assert_eq!(ok, json!({ "success": true, "data": [1, 2], "message": null }));

        let err = serde_json::to_value(ApiResponse::<()>::error("nope")).unwrap();
        assert_eq!(err, json!({ "success": false, "data": null, "message": "nope" }));
    }

    #[test]
    fn decodes_error_with_data() {
        let parsed: ApiResponse<Vec<String>> = serde_json::from_value(json!({
            "success": false,
            "data": ["a"],
            "message": "Tasks not in project"
        }))
        .unwrap();
        assert!(!parsed.is_success());
        assert_eq!(parsed.message(), Some("Tasks not in project"));
        assert_eq!(parsed.into_data(), Some(vec!["a".to_string()]));
    }
}
