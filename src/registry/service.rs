//! Registry service owning the shared item map.

use crate::registry::types::{Item, ItemPatch, NewItem, RegistryError};
use async_trait::async_trait;
use indexmap::IndexMap;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory store mapping generated identifiers to items.
///
/// The map lives behind a single lock, so every operation observes a state
/// consistent with some total order of completed operations. Construct the
/// service once near process start and share it through an `Arc`.
#[derive(Default)]
pub struct RegistryService {
    items: RwLock<IndexMap<String, Item>>,
}

/// Abstraction over the registry used by external surfaces.
#[async_trait]
pub trait RegistryApi: Send + Sync {
    /// Return every live item, in insertion order.
    async fn list_items(&self) -> Result<Vec<Item>, RegistryError>;

    /// Look up a single item by identifier.
    async fn get_item(&self, id: &str) -> Result<Item, RegistryError>;

    /// Validate the input and store a new item under a fresh identifier.
    async fn create_item(&self, input: NewItem) -> Result<Item, RegistryError>;

    /// Merge a partial update into the stored item.
    async fn update_item(&self, id: &str, patch: ItemPatch) -> Result<Item, RegistryError>;

    /// Remove an item, permanently invalidating its identifier.
    async fn delete_item(&self, id: &str) -> Result<(), RegistryError>;
}

impl RegistryService {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return every live item, in insertion order.
    pub async fn list_items(&self) -> Vec<Item> {
        let items = self.items.read().await;
        items.values().cloned().collect()
    }

    /// Look up a single item by identifier.
    pub async fn get_item(&self, id: &str) -> Result<Item, RegistryError> {
        let items = self.items.read().await;
        items.get(id).cloned().ok_or_else(|| RegistryError::NotFound {
            id: id.to_string(),
        })
    }

    /// Validate the input and store a new item.
    ///
    /// The registry assigns a fresh identifier and sets both timestamps to
    /// the current instant, so the stored item satisfies
    /// `created_at <= updated_at` from the start.
    pub async fn create_item(&self, input: NewItem) -> Result<Item, RegistryError> {
        input.validate()?;
        let now = OffsetDateTime::now_utc();
        let item = Item {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            description: input.description,
            price: input.price,
            tax: input.tax,
            tags: input.tags,
            created_at: now,
            updated_at: now,
        };
        let mut items = self.items.write().await;
        items.insert(item.id.clone(), item.clone());
        tracing::info!(item_id = %item.id, name = %item.name, "Created item");
        Ok(item)
    }

    /// Merge a partial update into the stored item.
    ///
    /// Absence of the identifier is reported before the patch fields are
    /// validated; validation runs before anything is mutated, so a failed
    /// update leaves the stored item untouched.
    pub async fn update_item(&self, id: &str, patch: ItemPatch) -> Result<Item, RegistryError> {
        let mut items = self.items.write().await;
        let item = items.get_mut(id).ok_or_else(|| RegistryError::NotFound {
            id: id.to_string(),
        })?;
        patch.validate()?;
        patch.apply_to(item);
        let now = OffsetDateTime::now_utc();
        // The wall clock may step backwards between calls; updated_at must
        // never regress below its previous value.
        if now > item.updated_at {
            item.updated_at = now;
        }
        tracing::info!(item_id = %id, "Updated item");
        Ok(item.clone())
    }

    /// Remove an item, permanently invalidating its identifier.
    pub async fn delete_item(&self, id: &str) -> Result<(), RegistryError> {
        let mut items = self.items.write().await;
        // shift_remove keeps the insertion order of the remaining items.
        match items.shift_remove(id) {
            Some(_) => {
                tracing::info!(item_id = %id, "Deleted item");
                Ok(())
            }
            None => Err(RegistryError::NotFound { id: id.to_string() }),
        }
    }
}

#[async_trait]
impl RegistryApi for RegistryService {
    async fn list_items(&self) -> Result<Vec<Item>, RegistryError> {
        Ok(RegistryService::list_items(self).await)
    }

    async fn get_item(&self, id: &str) -> Result<Item, RegistryError> {
        RegistryService::get_item(self, id).await
    }

    async fn create_item(&self, input: NewItem) -> Result<Item, RegistryError> {
        RegistryService::create_item(self, input).await
    }

    async fn update_item(&self, id: &str, patch: ItemPatch) -> Result<Item, RegistryError> {
        RegistryService::update_item(self, id, patch).await
    }

    async fn delete_item(&self, id: &str) -> Result<(), RegistryError> {
        RegistryService::delete_item(self, id).await
    }
}
