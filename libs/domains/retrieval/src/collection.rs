use tracing::{info, instrument};

use crate::error::{VectorError, VectorResult};
use crate::models::{CollectionHandle, CollectionSpec, CollectionStatus};
use crate::store::StoreClient;

/// Makes sure the target collection exists before anything is written to or read from it.
pub struct CollectionManager<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: StoreClient + ?Sized> CollectionManager<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Create the collection if it is absent.
    ///
    /// An existing collection is returned as is; its dimension is not compared with
    /// `spec.embedding_dim`; a mismatch surfaces on the first insert or search.
    #[instrument(skip(self, spec), fields(collection = %spec.name, dim = spec.embedding_dim))]
    pub async fn ensure_collection(
        &self,
        spec: &CollectionSpec,
    ) -> VectorResult<(CollectionHandle, CollectionStatus)> {
        if spec.name.trim().is_empty() {
            return Err(VectorError::Validation(
                "collection name must not be empty".to_string(),
            ));
        }
        if spec.embedding_dim == 0 {
            return Err(VectorError::Validation(
                "embedding dimension must be > 0".to_string(),
            ));
        }

        let status = if self.store.has_collection(&spec.name).await? {
            info!("Collection exists");
            CollectionStatus::Existing
        } else {
            self.store.create_collection(spec).await?;
            info!(auto_id = spec.auto_id, "Collection created");
            CollectionStatus::Created
        };

        Ok((CollectionHandle::from(spec), status))
    }
}
