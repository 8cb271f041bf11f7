//! Per-device flags kept next to the session

use chrono::NaiveDateTime;
use std::sync::Arc;
use tracing::warn;

use crate::error::StoreResult;
use crate::store::{FACE_ENROLLED, KeyValueStore, PUNCH_IN_TIME};

const PUNCH_IN_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Local state that outlives a single screen: the enrollment flag and the
/// last known punch-in instant
#[derive(Clone)]
pub struct LocalState {
    store: Arc<dyn KeyValueStore>,
}

impl LocalState {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Whether biometric keys were created on this device
    pub async fn is_face_enrolled(&self) -> StoreResult<bool> {
        Ok(self.store.get(FACE_ENROLLED).await?.as_deref() == Some("true"))
    }

    pub async fn set_face_enrolled(&self) -> StoreResult<()> {
        self.store.set(FACE_ENROLLED, "true").await
    }

    /// Last known punch-in instant; an unreadable value counts as absent
    pub async fn punch_in_time(&self) -> StoreResult<Option<NaiveDateTime>> {
        let Some(raw) = self.store.get(PUNCH_IN_TIME).await? else {
            return Ok(None);
        };

        match NaiveDateTime::parse_from_str(&raw, PUNCH_IN_FORMAT) {
            Ok(at) => Ok(Some(at)),
            Err(e) => {
                warn!("Ignoring unreadable punch-in time {:?}: {}", raw, e);
                Ok(None)
            }
        }
    }

    pub async fn set_punch_in_time(&self, at: NaiveDateTime) -> StoreResult<()> {
        self.store
            .set(PUNCH_IN_TIME, &at.format(PUNCH_IN_FORMAT).to_string())
            .await
    }

    pub async fn clear_punch_in_time(&self) -> StoreResult<()> {
        self.store.delete(PUNCH_IN_TIME).await
    }
}
