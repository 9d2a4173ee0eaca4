use crate::error::Result;
use crate::store::Store;
use chrono::{DateTime, Utc};
use spinwheel::{Identity, normalize_name};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub identity: Identity,
    pub is_new_identity: bool,
}

/// Writes participants into the contact directory
#[derive(Clone)]
pub struct Registrar {
    store: Arc<dyn Store>,
}

impl Registrar {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Registrar { store }
    }

    /// Validate and upsert a contact; re-registering renames it
    pub async fn register(
        &self,
        name: &str,
        phone: &str,
        now: DateTime<Utc>,
    ) -> Result<Registration> {
        let name = normalize_name(name)?;
        let identity = Identity::parse(phone)?;

        let is_new_identity = self.store.upsert_contact(&identity, &name, now).await?;
        tracing::info!(identity = %identity, is_new_identity, "Participant registered");

        Ok(Registration {
            identity,
            is_new_identity,
        })
    }
}
