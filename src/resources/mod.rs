use std::sync::Arc;

use serde_json::Value;

use crate::auth::Access;
use crate::database::{DatabaseError, Document, DocumentStore};
use crate::error::ApiError;

/// Static description of one document collection
#[derive(Debug)]
pub struct ResourceSpec {
    /// URL path segment under /app/
    pub path: &'static str,
    pub collection: &'static str,
    /// Field a detail lookup matches against
    pub id_field: &'static str,
    /// Listing requires a signed-in session
    pub gated_listing: bool,
    pub deletable: bool,
    pub countable: bool,
}

pub static EXERCISES: ResourceSpec = ResourceSpec {
    path: "exercises",
    collection: "exercises",
    id_field: "exerciseID",
    gated_listing: true,
    deletable: false,
    countable: false,
};

pub static PLAYLISTS: ResourceSpec = ResourceSpec {
    path: "playlists",
    collection: "playlists",
    id_field: "playlistID",
    gated_listing: false,
    deletable: false,
    countable: false,
};

pub static MOODS: ResourceSpec = ResourceSpec {
    path: "moods",
    collection: "moods",
    id_field: "entryID",
    gated_listing: false,
    deletable: false,
    countable: false,
};

pub static JOURNAL_ENTRIES: ResourceSpec = ResourceSpec {
    path: "journalentries",
    collection: "journalentries",
    id_field: "entryID",
    gated_listing: false,
    deletable: true,
    countable: false,
};

pub static JOURNALS: ResourceSpec = ResourceSpec {
    path: "journals",
    collection: "journals",
    id_field: "journalID",
    gated_listing: false,
    deletable: false,
    countable: false,
};

pub static QUOTES: ResourceSpec = ResourceSpec {
    path: "quotes",
    collection: "quotes",
    id_field: "quoteID",
    gated_listing: false,
    deletable: false,
    countable: true,
};

pub static ALL_RESOURCES: [&ResourceSpec; 6] =
    [&EXERCISES, &PLAYLISTS, &MOODS, &JOURNAL_ENTRIES, &JOURNALS, &QUOTES];

/// Access to one collection through the shared document store
#[derive(Clone)]
pub struct ResourceModel {
    spec: &'static ResourceSpec,
    store: Arc<dyn DocumentStore>,
    require_session: bool,
}

impl ResourceModel {
    pub fn new(spec: &'static ResourceSpec, store: Arc<dyn DocumentStore>, require_session: bool) -> Self {
        Self {
            spec,
            store,
            require_session,
        }
    }

    pub fn spec(&self) -> &'static ResourceSpec {
        self.spec
    }

    fn authorize(&self, access: &Access, gated: bool) -> Result<(), ApiError> {
        if (gated || self.require_session) && !access.is_authenticated() {
            tracing::info!("user is not authenticated; {} requires a session", self.spec.path);
            return Err(ApiError::SessionRequired);
        }
        if let Some(user) = access.user() {
            tracing::debug!(user_id = %user.id, display_name = %user.display_name, "authenticated request");
        }
        Ok(())
    }

    pub async fn retrieve_all(&self, access: &Access) -> Result<Vec<Document>, ApiError> {
        self.authorize(access, self.spec.gated_listing)?;
        Ok(self.store.find_all(self.spec.collection).await?)
    }

    pub async fn retrieve_details(&self, access: &Access, id: &str) -> Result<Option<Document>, ApiError> {
        self.authorize(access, false)?;
        Ok(self
            .store
            .find_one(self.spec.collection, self.spec.id_field, id)
            .await?)
    }

    /// Insert an object, or each object of an array. Returns the number stored.
    ///
    /// An array is checked and stored as a unit: one bad element or one store
    /// failure leaves the collection unchanged.
    pub async fn create(&self, access: &Access, payload: Value) -> Result<usize, ApiError> {
        self.authorize(access, false)?;

        let ids = match payload {
            Value::Array(items) => {
                let documents = items
                    .into_iter()
                    .map(|item| self.check_document(item))
                    .collect::<Result<Vec<_>, _>>()?;
                self.store.insert_many(self.spec.collection, documents).await?
            }
            other => {
                let document = self.check_document(other)?;
                vec![self.store.insert(self.spec.collection, document).await?]
            }
        };
        Ok(ids.len())
    }

    pub async fn delete_entry(&self, access: &Access, id: &str) -> Result<u64, ApiError> {
        self.authorize(access, false)?;
        Ok(self
            .store
            .delete_where(self.spec.collection, self.spec.id_field, id)
            .await?)
    }

    pub async fn count(&self, access: &Access) -> Result<u64, ApiError> {
        self.authorize(access, false)?;
        Ok(self.store.count(self.spec.collection).await?)
    }

    fn check_document(&self, value: Value) -> Result<Document, DatabaseError> {
        let Value::Object(document) = value else {
            return Err(DatabaseError::Validation(format!(
                "{} documents must be JSON objects",
                self.spec.path
            )));
        };
        match document.get(self.spec.id_field) {
            None | Some(Value::Null) => Err(DatabaseError::Validation(format!(
                "missing required field {}",
                self.spec.id_field
            ))),
            Some(_) => Ok(document),
        }
    }
}

/// The six resource models sharing one store
#[derive(Clone)]
pub struct Resources {
    models: Vec<ResourceModel>,
}

impl Resources {
    pub fn new(store: Arc<dyn DocumentStore>, require_session: bool) -> Self {
        let models = ALL_RESOURCES
            .iter()
            .map(|&spec| ResourceModel::new(spec, store.clone(), require_session))
            .collect();
        Self { models }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceModel> {
        self.models.iter()
    }

    /// Look up the model for an /app/ path segment
    #[cfg(test)]
    fn by_path(&self, path: &str) -> Option<&ResourceModel> {
        self.models.iter().find(|model| model.spec.path == path)
    }
}
