//! Request handlers for the raw alarms endpoints.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::messages::{DeleteRawAlarmRequest, GetRawAlarmsRequest, PutRawAlarmRequest, RequestContext};
use raas_core::{AlarmStore, AlarmValue, Cursor, NotificationId, Pack, Subpartition};
use std::sync::Arc;
use tracing::info;

/// Handler for raw alarms requests.
///
/// Applies request defaults and limits, then calls the store.
pub struct RequestHandler {
    config: ServerConfig,
    store: Arc<dyn AlarmStore>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(config: ServerConfig, store: Arc<dyn AlarmStore>) -> Self {
        Self { config, store }
    }

    /// Returns the handler's configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Handles a pack query.
    pub fn get_raw_alarms(
        &self,
        context: &RequestContext,
        request: GetRawAlarmsRequest,
    ) -> ServerResult<Pack> {
        let how_many = match request.how_many {
            Some(how_many) if how_many == 0 || how_many > self.config.max_how_many => {
                return Err(ServerError::InvalidRequest(format!(
                    "howMany must be between 1 and {}, got {how_many}",
                    self.config.max_how_many
                )));
            }
            Some(how_many) => how_many,
            None => self.config.effective_default_how_many(),
        };
        if request
            .tag_of_the_first_alarm_to_be_returned
            .as_deref()
            .is_some_and(str::is_empty)
        {
            return Err(ServerError::InvalidRequest(
                "tagOfTheFirstAlarmToBeReturned must not be empty".to_string(),
            ));
        }
        let subpartition = self.subpartition(request.subpartition_name);
        let cursor = request.tag_of_the_first_alarm_to_be_returned.map(Cursor::new);

        info!(
            partition = %context.partition,
            %subpartition,
            cursor = cursor.as_ref().map(Cursor::as_str),
            how_many,
            "raw alarms"
        );
        Ok(self
            .store
            .get_pack(&context.partition, &subpartition, cursor.as_ref(), how_many)?)
    }

    /// Handles a subpartition listing.
    pub fn get_raw_alarms_subpartitions(
        &self,
        context: &RequestContext,
    ) -> ServerResult<Vec<Subpartition>> {
        Ok(self.store.list_subpartitions(&context.partition)?)
    }

    /// Handles a create or replace.
    pub fn put_raw_alarm(
        &self,
        context: &RequestContext,
        request: PutRawAlarmRequest,
    ) -> ServerResult<()> {
        let subpartition = self.subpartition(request.subpartition_name);
        let notification_id = NotificationId::new(request.notification_identifier);
        let trimmed = request.body.trim();
        let value = (!trimmed.is_empty() && trimmed != "null").then(|| AlarmValue::new(request.body));

        info!(
            partition = %context.partition,
            %subpartition,
            %notification_id,
            delete = value.is_none(),
            "put raw alarm"
        );
        self.store
            .put(&context.partition, &subpartition, &notification_id, value.as_ref())?;
        Ok(())
    }

    /// Handles a delete.
    pub fn delete_raw_alarm(
        &self,
        context: &RequestContext,
        request: DeleteRawAlarmRequest,
    ) -> ServerResult<()> {
        let subpartition = self.subpartition(request.subpartition_name);
        let notification_id = NotificationId::new(request.notification_identifier);

        info!(
            partition = %context.partition,
            %subpartition,
            %notification_id,
            "delete raw alarm"
        );
        self.store
            .delete(&context.partition, &subpartition, &notification_id)?;
        Ok(())
    }

    fn subpartition(&self, name: Option<String>) -> Subpartition {
        Subpartition::new(name.unwrap_or_else(|| self.config.default_subpartition.clone()))
    }
}
