//! Request and response shapes.

use crate::error::{ServerError, ServerResult};
use raas_core::PartitionKey;
use serde::{Deserialize, Serialize};

/// Per-request scope supplied by the transport (for instance by an
/// authentication layer), never by the request parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Partition every operation of the request applies to.
    pub partition: PartitionKey,
}

impl RequestContext {
    /// Creates a context for `domain` and `adapter_name`.
    pub fn new(domain: impl Into<String>, adapter_name: impl Into<String>) -> Self {
        Self {
            partition: PartitionKey::new(domain, adapter_name),
        }
    }
}

/// Query of one pack of raw alarms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetRawAlarmsRequest {
    /// Subpartition to read.
    pub subpartition_name: Option<String>,
    /// Cursor returned by the previous pack. Absent starts a traversal; an
    /// empty tag is rejected.
    pub tag_of_the_first_alarm_to_be_returned: Option<String>,
    /// Maximum pack size.
    pub how_many: Option<usize>,
}

impl GetRawAlarmsRequest {
    /// Builds a request from decoded query parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidRequest`] if `howMany` is not a number.
    pub fn from_query<'a, I>(params: I) -> ServerResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut request = Self::default();
        for (name, value) in params {
            match name {
                "subpartitionName" => request.subpartition_name = Some(value.to_string()),
                "tagOfTheFirstAlarmToBeReturned" => {
                    request.tag_of_the_first_alarm_to_be_returned = Some(value.to_string());
                }
                "howMany" => {
                    let how_many = value.parse().map_err(|_| {
                        ServerError::InvalidRequest(format!("howMany is not a number: {value:?}"))
                    })?;
                    request.how_many = Some(how_many);
                }
                _ => {}
            }
        }
        Ok(request)
    }
}

/// Create or replace one raw alarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutRawAlarmRequest {
    /// Alarm identifier.
    pub notification_identifier: String,
    /// Subpartition to write; the configured default when absent.
    pub subpartition_name: Option<String>,
    /// Alarm value as JSON text. Empty or `null` deletes the alarm.
    pub body: String,
}

/// Delete one raw alarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRawAlarmRequest {
    /// Alarm identifier.
    pub notification_identifier: String,
    /// Subpartition to write; the configured default when absent.
    pub subpartition_name: Option<String>,
}

/// Body of an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status code.
    pub status: u16,
    /// Error description.
    pub error: String,
}

impl From<&ServerError> for ErrorResponse {
    fn from(error: &ServerError) -> Self {
        Self {
            status: error.status_code(),
            error: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_request_from_json() {
        let request: GetRawAlarmsRequest =
            serde_json::from_str(r#"{"subpartitionName":"1","howMany":5}"#).unwrap();
        assert_eq!(request.subpartition_name.as_deref(), Some("1"));
        assert_eq!(request.how_many, Some(5));
        assert!(request.tag_of_the_first_alarm_to_be_returned.is_none());

        let empty: GetRawAlarmsRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, GetRawAlarmsRequest::default());
    }

    #[test]
    fn get_request_from_query() {
        let request = GetRawAlarmsRequest::from_query([
            ("tagOfTheFirstAlarmToBeReturned", "12"),
            ("howMany", "3"),
            ("unrelated", "x"),
        ])
        .unwrap();
        assert_eq!(request.tag_of_the_first_alarm_to_be_returned.as_deref(), Some("12"));
        assert_eq!(request.how_many, Some(3));
        assert!(request.subpartition_name.is_none());

        let bad = GetRawAlarmsRequest::from_query([("howMany", "many")]);
        assert!(matches!(bad, Err(ServerError::InvalidRequest(_))));
    }

    #[test]
    fn error_response_from_error() {
        let response = ErrorResponse::from(&ServerError::InvalidRequest("howMany".into()));
        assert_eq!(response.status, 400);
        assert!(response.error.contains("howMany"));
    }
}
