// Uniform response envelope for backend resources
use crate::application::errors::ClientError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ResourceEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Unwrap the payload. `data` is only trusted when `success` is set.
    pub fn into_data(self) -> Result<T, ClientError> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(ClientError::Rejected(
                "response reported success without data".to_string(),
            )),
            (false, _) => Err(ClientError::Rejected(
                self.error
                    .unwrap_or_else(|| "request was not successful".to_string()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_data_success() {
        let envelope = ResourceEnvelope::ok(vec![1, 2, 3]);
        assert_eq!(envelope.into_data().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_failed_envelope_data_is_not_trusted() {
        let envelope = ResourceEnvelope {
            success: false,
            data: Some(42),
            error: Some("database offline".to_string()),
        };

        let err = envelope.into_data().unwrap_err();
        assert!(matches!(err, ClientError::Rejected(ref msg) if msg == "database offline"));
    }

    #[test]
    fn test_success_without_data_is_rejected() {
        let envelope: ResourceEnvelope<u32> = ResourceEnvelope {
            success: true,
            data: None,
            error: None,
        };
        assert!(envelope.into_data().is_err());
    }

    #[test]
    fn test_deserialize_without_error_field() {
        let envelope: ResourceEnvelope<Vec<u32>> =
            serde_json::from_str(r#"{"success": true, "data": [7]}"#).unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.error, None);
        assert_eq!(envelope.data, Some(vec![7]));
    }
}
