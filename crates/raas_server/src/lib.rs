//! # RAAS Server
//!
//! Request surface of the raw active alarms store.
//!
//! This crate provides:
//! - Typed requests for the four endpoints, with defaults and limits
//! - Routing of method and path onto those requests
//! - JSON rendering of packs, subpartition lists and errors
//! - Error classification into client (4xx) and server (5xx) failures
//!
//! # Endpoints
//!
//! | Method | Path | Operation |
//! |---|---|---|
//! | GET | `/v2/rawalarms` | one pack (`subpartitionName`, `tagOfTheFirstAlarmToBeReturned`, `howMany`) |
//! | GET | `/v2/rawalarmssubpartitions` | subpartition names |
//! | PUT | `/v2/rawalarms/{notificationIdentifier}` | create or replace |
//! | DELETE | `/v2/rawalarms/{notificationIdentifier}` | delete |
//!
//! The partition (domain and adapter name) is never a request parameter: the
//! transport resolves it and passes a [`RequestContext`].

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod handler;
mod messages;
mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::RequestHandler;
pub use messages::{
    DeleteRawAlarmRequest, ErrorResponse, GetRawAlarmsRequest, PutRawAlarmRequest, RequestContext,
};
pub use server::{RaasRequest, RaasServer, Response};
