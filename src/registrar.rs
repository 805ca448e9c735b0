use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::model::SensorRecord;
use crate::store::RealtimeStore;

/// Creates sensor records under freshly generated keys.
#[derive(Clone)]
pub struct SensorRegistrar {
    store: Arc<dyn RealtimeStore>,
    sensors_path: String,
}

impl SensorRegistrar {
    pub fn new(store: Arc<dyn RealtimeStore>, sensors_path: impl Into<String>) -> Self {
        Self {
            store,
            sensors_path: sensors_path.into(),
        }
    }

    /// Returns the new key. A failed write is logged and otherwise ignored.
    #[instrument(skip(self))]
    pub async fn create_sensor(&self, name: &str, description: &str) -> String {
        let key = self.store.generate_key();
        let record = SensorRecord::new(name, description);
        match self
            .store
            .update_children(&self.sensors_path, record.updates_under(&key))
            .await
        {
            Ok(()) => info!(%key, "registered sensor"),
            Err(err) => warn!(%err, %key, "sensor registration was not saved"),
        }
        key
    }
}
