use serde::{Deserialize, Serialize};

/// 统一 JSON 响应包: {status, data, message, count}
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            data: Some(data),
            message: None,
            count: None,
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            status: "success".to_string(),
            data: Some(data),
            message: Some(message),
            count: None,
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// 列表响应附带 count
    pub fn list(data: Vec<T>, entity: &str) -> Self {
        let count = data.len();
        Self {
            status: "success".to_string(),
            data: Some(data),
            message: Some(format!("Retrieved {count} {entity}")),
            count: Some(count),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: String) -> Self {
        Self {
            status: "success".to_string(),
            data: None,
            message: Some(message),
            count: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_envelope_has_count() {
        let body = serde_json::to_value(ApiResponse::list(vec![1, 2, 3], "members")).unwrap();
        assert_eq!(body["status"], "success");
        assert_eq!(body["count"], 3);
        assert_eq!(body["message"], "Retrieved 3 members");
    }

    #[test]
    fn test_message_envelope_skips_data() {
        let body = serde_json::to_value(ApiResponse::message("deleted".into())).unwrap();
        assert!(body.get("data").is_none());
        assert!(body.get("count").is_none());
    }
}
