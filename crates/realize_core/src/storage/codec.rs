use crate::error::AppError;
use crate::model::ScheduleEvent;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Encode/decode pair for one stored value.
pub trait Codec<T> {
    fn encode(&self, value: &T) -> Result<String, AppError>;
    fn decode(&self, blob: &str) -> Result<T, AppError>;
}

/// Plain JSON through serde; enough for values whose fields are strings,
/// booleans, enums and nested records of those.
pub struct JsonCodec<T>(PhantomData<fn() -> T>);

impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Serialize + DeserializeOwned> Codec<T> for JsonCodec<T> {
    fn encode(&self, value: &T) -> Result<String, AppError> {
        serde_json::to_string(value).map_err(|err| AppError::invalid_data(err.to_string()))
    }

    fn decode(&self, blob: &str) -> Result<T, AppError> {
        serde_json::from_str(blob).map_err(|err| AppError::invalid_data(err.to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredScheduleEvent {
    id: String,
    title: String,
    start: String,
    end: String,
    is_all_day: bool,
}

impl StoredScheduleEvent {
    fn revive(self) -> Result<ScheduleEvent, AppError> {
        let start = parse_timestamp(&self.id, "start", &self.start)?;
        let end = parse_timestamp(&self.id, "end", &self.end)?;
        Ok(ScheduleEvent {
            id: self.id,
            title: self.title,
            start,
            end,
            is_all_day: self.is_all_day,
        })
    }
}

fn parse_timestamp(id: &str, field: &str, raw: &str) -> Result<OffsetDateTime, AppError> {
    OffsetDateTime::parse(raw, &Rfc3339).map_err(|err| {
        AppError::invalid_data(format!("event {id}: invalid {field} '{raw}': {err}"))
    })
}

/// Schedule events keep `start`/`end` as RFC 3339 text on disk and come
/// back as `OffsetDateTime`; every other field passes through untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScheduleCodec;

impl Codec<Vec<ScheduleEvent>> for ScheduleCodec {
    fn encode(&self, value: &Vec<ScheduleEvent>) -> Result<String, AppError> {
        serde_json::to_string(value).map_err(|err| AppError::invalid_data(err.to_string()))
    }

    fn decode(&self, blob: &str) -> Result<Vec<ScheduleEvent>, AppError> {
        let stored: Vec<StoredScheduleEvent> =
            serde_json::from_str(blob).map_err(|err| AppError::invalid_data(err.to_string()))?;
        stored.into_iter().map(StoredScheduleEvent::revive).collect()
    }
}
