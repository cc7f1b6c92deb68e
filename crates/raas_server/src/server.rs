//! Raw alarms server.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::RequestHandler;
use crate::messages::{
    DeleteRawAlarmRequest, ErrorResponse, GetRawAlarmsRequest, PutRawAlarmRequest, RequestContext,
};
use raas_core::AlarmStore;
use std::sync::Arc;
use tracing::warn;

const RAW_ALARMS_PATH: &str = "/v2/rawalarms";
const SUBPARTITIONS_PATH: &str = "/v2/rawalarmssubpartitions";

/// One operation of the raw alarms API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaasRequest {
    /// `GET /v2/rawalarms`
    GetRawAlarms(GetRawAlarmsRequest),
    /// `GET /v2/rawalarmssubpartitions`
    GetRawAlarmsSubpartitions,
    /// `PUT /v2/rawalarms/{notificationIdentifier}`
    PutRawAlarm(PutRawAlarmRequest),
    /// `DELETE /v2/rawalarms/{notificationIdentifier}`
    DeleteRawAlarm(DeleteRawAlarmRequest),
}

impl RaasRequest {
    /// Maps a method, path, decoded query parameters and body to an operation.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::NotFound`] if nothing is mapped to the method
    /// and path, or [`ServerError::InvalidRequest`] for bad parameters.
    pub fn route<'a, I>(method: &str, path: &str, query: I, body: &str) -> ServerResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let not_found = || ServerError::NotFound {
            method: method.to_string(),
            path: path.to_string(),
        };
        let path = path.trim_end_matches('/');

        match (method.to_ascii_uppercase().as_str(), path) {
            ("GET", RAW_ALARMS_PATH) => Ok(Self::GetRawAlarms(GetRawAlarmsRequest::from_query(query)?)),
            ("GET", SUBPARTITIONS_PATH) => Ok(Self::GetRawAlarmsSubpartitions),
            (method @ ("PUT" | "DELETE"), path) => {
                let id = path
                    .strip_prefix(RAW_ALARMS_PATH)
                    .and_then(|rest| rest.strip_prefix('/'))
                    .filter(|id| !id.is_empty() && !id.contains('/'))
                    .ok_or_else(not_found)?;
                let subpartition_name = query
                    .into_iter()
                    .find(|(name, _)| *name == "subpartitionName")
                    .map(|(_, value)| value.to_string());
                if method == "PUT" {
                    Ok(Self::PutRawAlarm(PutRawAlarmRequest {
                        notification_identifier: id.to_string(),
                        subpartition_name,
                        body: body.to_string(),
                    }))
                } else {
                    Ok(Self::DeleteRawAlarm(DeleteRawAlarmRequest {
                        notification_identifier: id.to_string(),
                        subpartition_name,
                    }))
                }
            }
            _ => Err(not_found()),
        }
    }
}

/// A rendered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// JSON body; empty for writes.
    pub body: String,
}

/// The raw alarms server.
///
/// Transport-agnostic: the transport decodes a request into a
/// [`RaasRequest`], supplies the [`RequestContext`] and sends back the
/// [`Response`].
///
/// # Example
///
/// ```
/// use raas_core::{ReferenceStore, SubpartitionLayout};
/// use raas_server::{RaasServer, RequestContext, ServerConfig};
/// use std::sync::Arc;
///
/// let store = Arc::new(ReferenceStore::new(SubpartitionLayout::default()));
/// let server = RaasServer::new(ServerConfig::default(), store);
/// let context = RequestContext::new("ala", "ma");
///
/// let response = server.handle_http(&context, "GET", "/v2/rawalarms", [("howMany", "10")], "");
/// assert_eq!(response.status, 200);
/// ```
pub struct RaasServer {
    handler: RequestHandler,
}

impl RaasServer {
    /// Creates a server over `store`.
    pub fn new(config: ServerConfig, store: Arc<dyn AlarmStore>) -> Self {
        Self {
            handler: RequestHandler::new(config, store),
        }
    }

    /// Returns the request handler.
    pub fn handler(&self) -> &RequestHandler {
        &self.handler
    }

    /// Handles an operation, rendering success or failure.
    pub fn handle(&self, context: &RequestContext, request: RaasRequest) -> Response {
        match self.dispatch(context, request) {
            Ok(body) => Response { status: 200, body },
            Err(e) => Self::error_response(&e),
        }
    }

    /// Routes and handles a raw HTTP-shaped request.
    pub fn handle_http<'a, I>(
        &self,
        context: &RequestContext,
        method: &str,
        path: &str,
        query: I,
        body: &str,
    ) -> Response
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        match RaasRequest::route(method, path, query, body) {
            Ok(request) => self.handle(context, request),
            Err(e) => Self::error_response(&e),
        }
    }

    fn dispatch(&self, context: &RequestContext, request: RaasRequest) -> ServerResult<String> {
        match request {
            RaasRequest::GetRawAlarms(req) => {
                let pack = self.handler.get_raw_alarms(context, req)?;
                Ok(serde_json::to_string(&pack)?)
            }
            RaasRequest::GetRawAlarmsSubpartitions => {
                let subpartitions = self.handler.get_raw_alarms_subpartitions(context)?;
                Ok(serde_json::to_string(&subpartitions)?)
            }
            RaasRequest::PutRawAlarm(req) => {
                self.handler.put_raw_alarm(context, req)?;
                Ok(String::new())
            }
            RaasRequest::DeleteRawAlarm(req) => {
                self.handler.delete_raw_alarm(context, req)?;
                Ok(String::new())
            }
        }
    }

    fn error_response(error: &ServerError) -> Response {
        if error.is_server_error() {
            warn!(error = %error, "request failed");
        }
        let body = ErrorResponse::from(error);
        Response {
            status: body.status,
            body: serde_json::to_string(&body).unwrap_or_else(|_| body.error.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raas_core::{LogStoreConfig, LogStore, Pack, ReferenceStore, SubpartitionLayout};
    use raas_log::InMemoryLog;

    fn no_query() -> [(&'static str, &'static str); 0] {
        []
    }

    fn reference_server() -> RaasServer {
        let store = Arc::new(ReferenceStore::new(SubpartitionLayout::default()));
        RaasServer::new(ServerConfig::default(), store)
    }

    #[test]
    fn routing() {
        assert_eq!(
            RaasRequest::route("GET", "/v2/rawalarmssubpartitions", no_query(), "").unwrap(),
            RaasRequest::GetRawAlarmsSubpartitions
        );
        assert!(matches!(
            RaasRequest::route("put", "/v2/rawalarms/kota", no_query(), "{}").unwrap(),
            RaasRequest::PutRawAlarm(PutRawAlarmRequest { ref notification_identifier, .. })
                if notification_identifier == "kota"
        ));
        assert!(matches!(
            RaasRequest::route("DELETE", "/v2/rawalarms/", no_query(), ""),
            Err(ServerError::NotFound { .. })
        ));
        assert!(matches!(
            RaasRequest::route("POST", "/v2/rawalarms", no_query(), ""),
            Err(ServerError::NotFound { .. })
        ));
    }

    #[test]
    fn full_request_flow() {
        let server = reference_server();
        let context = RequestContext::new("ala", "ma");

        for id in ["eric2g:33", "siem:44", "huawei:11"] {
            let path = format!("/v2/rawalarms/{id}");
            let response = server.handle_http(&context, "PUT", &path, no_query(), r#"{"x":1}"#);
            assert_eq!(response.status, 200);
        }

        let response = server.handle_http(&context, "GET", "/v2/rawalarms", [("howMany", "5")], "");
        assert_eq!(response.status, 200);
        let pack: Pack = serde_json::from_str(&response.body).unwrap();
        let ids: Vec<_> = pack.notification_ids().iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["eric2g:33", "siem:44", "huawei:11"]);
        assert!(response.body.contains("\"tagOfTheNextAvailableAlarm\":null"));

        let response = server.handle_http(&context, "DELETE", "/v2/rawalarms/siem:44", no_query(), "");
        assert_eq!(response.status, 200);

        let response = server.handle_http(&context, "GET", "/v2/rawalarmssubpartitions", no_query(), "");
        assert_eq!(response.body, r#"["0"]"#);
    }

    #[test]
    fn errors_render_as_json() {
        let server = reference_server();
        let context = RequestContext::new("ala", "ma");

        let response = server.handle_http(&context, "GET", "/v2/rawalarms", [("howMany", "0")], "");
        assert_eq!(response.status, 400);
        let body: ErrorResponse = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body.status, 400);

        let response = server.handle_http(&context, "GET", "/v2/nothing", no_query(), "");
        assert_eq!(response.status, 404);
    }

    #[test]
    fn log_cursor_errors_are_client_errors() {
        let store = LogStore::new(
            Arc::new(InMemoryLog::new()),
            SubpartitionLayout::default(),
            LogStoreConfig::default(),
        )
        .unwrap();
        let server = RaasServer::new(ServerConfig::default(), Arc::new(store));
        let context = RequestContext::new("ala", "ma");

        let response = server.handle_http(
            &context,
            "GET",
            "/v2/rawalarms",
            [("tagOfTheFirstAlarmToBeReturned", "kota")],
            "",
        );
        assert_eq!(response.status, 400);
    }

    #[test]
    fn partitions_are_isolated() {
        let server = reference_server();
        server.handle_http(&RequestContext::new("ala", "ma"), "PUT", "/v2/rawalarms/a", no_query(), "{}");

        let response = server.handle_http(&RequestContext::new("ala", "kota"), "GET", "/v2/rawalarms", no_query(), "");
        let pack: Pack = serde_json::from_str(&response.body).unwrap();
        assert!(pack.is_empty());
    }
}
