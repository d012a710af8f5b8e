//! # Dataset Loader
//!
//! Replaces everything in the four menu collections and the image bucket with
//! the contents of a [`Dataset`].
//!
//! ## Phases
//!
//! 1. **Clear**: every document in categories, customizations, menu and
//!    menu_customizations is deleted, then every file in the bucket. Deletes
//!    inside one collection run concurrently; collections are cleared one
//!    after the other.
//! 2. **Categories**: created in dataset order, producing the category index.
//! 3. **Customizations**: created in dataset order, producing the
//!    customization index.
//! 4. **Menu items**: one item at a time. The category and customization ids
//!    are looked up first, then the image is re-hosted, the item is created
//!    with its category id and one link per customization is created. Item
//!    `n + 1` does not start until item `n` is fully linked. Names may repeat;
//!    every entry becomes its own document.
//!
//! Each phase takes the indexes built before it and returns its own, so the
//! dependency order is visible in the signatures.
//!
//! ## Failure policy
//!
//! The dataset is validated before the clear phase; an invalid dataset never
//! touches the backend. After that, the first backend error stops the run and
//! is returned with the phase it happened in. Image problems are the only
//! failures that are absorbed (see [`crate::images`]).

use std::fmt;
use std::sync::Arc;

use futures_util::future::try_join_all;
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use crate::config::{CollectionIds, SeedConfig};
use crate::dataset::{Category, Customization, Dataset, MenuItem};
use crate::errors::{ReferenceKind, SeedError, SeedResult, StoreResult};
use crate::images::{ImageResolver, ImageSource};
use crate::store::{DocumentId, DocumentStore, FileStore};

mod name_index;
mod report;

pub use name_index::NameIndex;
pub use report::{ClearReport, ImageOutcome, Link, MenuPhaseOutput, SeedReport};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    Clear,
    Categories,
    Customizations,
    MenuItems,
    Links,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Clear => "clear",
            Phase::Categories => "categories",
            Phase::Customizations => "customizations",
            Phase::MenuItems => "menu items",
            Phase::Links => "menu customizations",
        };
        f.write_str(name)
    }
}

pub struct DatasetLoader {
    dataset: Dataset,
    documents: Arc<dyn DocumentStore>,
    files: Arc<dyn FileStore>,
    images: ImageResolver,
    collections: CollectionIds,
    bucket: String,
}

impl DatasetLoader {
    pub fn new(
        config: &SeedConfig,
        dataset: Dataset,
        documents: Arc<dyn DocumentStore>,
        files: Arc<dyn FileStore>,
        image_source: Arc<dyn ImageSource>,
    ) -> Self {
        let images = ImageResolver::new(
            image_source,
            files.clone(),
            config.backend.bucket_id.clone(),
            &config.images,
        );

        Self {
            dataset,
            documents,
            files,
            images,
            collections: config.collections.clone(),
            bucket: config.backend.bucket_id.clone(),
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Clear the backend and seed it with the dataset.
    pub async fn run(&self) -> SeedResult<SeedReport> {
        self.dataset.ensure_valid()?;

        info!("Starting seeding process");
        let cleared = self.clear_all().await?;
        let categories = self.create_categories(&self.dataset.categories).await?;
        let customizations = self
            .create_customizations(&self.dataset.customizations)
            .await?;
        let menu = self
            .create_menu_items(&self.dataset.menu, &categories, &customizations)
            .await?;
        info!("Seeding complete");

        Ok(SeedReport {
            cleared,
            categories,
            customizations,
            menu: menu.menu,
            menu_items: menu.menu_items,
            links: menu.links,
            images: menu.images,
        })
    }

    /// Delete every document in the four collections and every file in the
    /// bucket. Safe to repeat.
    pub async fn clear_all(&self) -> SeedResult<ClearReport> {
        info!("Clearing all collections and storage");
        let mut report = ClearReport::default();

        for collection in self.collections.in_clear_order() {
            let deleted = self
                .clear_collection(collection)
                .await
                .map_err(|e| SeedError::store(Phase::Clear, e))?;
            report.documents.insert(collection.to_string(), deleted);
        }

        report.files = self
            .clear_bucket()
            .await
            .map_err(|e| SeedError::store(Phase::Clear, e))?;

        Ok(report)
    }

    #[instrument(skip(self))]
    async fn clear_collection(&self, collection: &str) -> StoreResult<usize> {
        info!("Clearing collection: {}", collection);
        let mut deleted = 0;

        loop {
            let ids = self.documents.list_documents(collection).await?;
            if ids.is_empty() {
                break;
            }
            debug!("Found {} documents in collection {}", ids.len(), collection);

            try_join_all(ids.iter().map(|id| {
                debug!("Deleting document ID: {} from collection {}", id, collection);
                self.documents.delete_document(collection, id)
            }))
            .await?;
            deleted += ids.len();
        }

        info!("Cleared collection: {} ({} documents)", collection, deleted);
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn clear_bucket(&self) -> StoreResult<usize> {
        let bucket = self.bucket.as_str();
        info!("Clearing storage bucket: {}", bucket);
        let mut deleted = 0;

        loop {
            let ids = self.files.list_files(bucket).await?;
            if ids.is_empty() {
                break;
            }
            debug!("Found {} files in bucket {}", ids.len(), bucket);

            try_join_all(ids.iter().map(|id| {
                debug!("Deleting file ID: {} from bucket {}", id, bucket);
                self.files.delete_file(bucket, id)
            }))
            .await?;
            deleted += ids.len();
        }

        info!("Cleared storage bucket: {} ({} files)", bucket, deleted);
        Ok(deleted)
    }

    #[instrument(skip_all, fields(count = categories.len()))]
    pub async fn create_categories(&self, categories: &[Category]) -> SeedResult<NameIndex> {
        info!("Creating categories");
        let mut index = NameIndex::new();

        for category in categories {
            debug!("Creating category: {}", category.name);
            let id = self
                .create(
                    Phase::Categories,
                    &self.collections.categories,
                    category_payload(category),
                )
                .await?;
            info!("Created category ID: {} for {}", id, category.name);
            index.insert(category.name.as_str(), id);
        }

        Ok(index)
    }

    #[instrument(skip_all, fields(count = customizations.len()))]
    pub async fn create_customizations(
        &self,
        customizations: &[Customization],
    ) -> SeedResult<NameIndex> {
        info!("Creating customizations");
        let mut index = NameIndex::new();

        for customization in customizations {
            debug!(
                "Creating customization: {} (Type: {}, Price: {})",
                customization.name, customization.kind, customization.price
            );
            let id = self
                .create(
                    Phase::Customizations,
                    &self.collections.customizations,
                    customization_payload(customization),
                )
                .await?;
            info!("Created customization ID: {} for {}", id, customization.name);
            index.insert(customization.name.as_str(), id);
        }

        Ok(index)
    }

    #[instrument(skip_all, fields(count = items.len()))]
    pub async fn create_menu_items(
        &self,
        items: &[MenuItem],
        categories: &NameIndex,
        customizations: &NameIndex,
    ) -> SeedResult<MenuPhaseOutput> {
        info!("Creating menu items");
        let mut output = MenuPhaseOutput::default();

        for item in items {
            debug!("Processing menu item: {}", item.name);
            let category_id =
                categories.resolve(ReferenceKind::Category, &item.category_name, &item.name)?;
            let customization_ids = item
                .customizations
                .iter()
                .map(|name| {
                    customizations.resolve(ReferenceKind::Customization, name, &item.name)
                })
                .collect::<SeedResult<Vec<_>>>()?;

            let resolution = self.images.resolve(&item.image_url).await;

            debug!(
                "Creating menu item: {} with category {}",
                item.name, item.category_name
            );
            let menu_id = self
                .create(
                    Phase::MenuItems,
                    &self.collections.menu,
                    menu_item_payload(item, resolution.url(), category_id),
                )
                .await?;
            info!("Created menu item ID: {} for {}", menu_id, item.name);
            if output.menu.get(&item.name).is_some() {
                warn!(
                    "Menu item name {} appears more than once; lookups use the latest",
                    item.name
                );
            }
            output.menu.insert(item.name.as_str(), menu_id.clone());
            output.menu_items.push(menu_id.clone());
            output.images.push(ImageOutcome {
                item: item.name.clone(),
                resolution,
            });

            let links = self
                .link_customizations(item, &menu_id, &customization_ids)
                .await?;
            output.links.extend(links);
        }

        Ok(output)
    }

    async fn link_customizations(
        &self,
        item: &MenuItem,
        menu_id: &DocumentId,
        customization_ids: &[&DocumentId],
    ) -> SeedResult<Vec<Link>> {
        debug!("Associating customizations for menu item: {}", item.name);
        let mut links = Vec::with_capacity(customization_ids.len());

        for (name, customization_id) in item.customizations.iter().zip(customization_ids) {
            let id = self
                .create(
                    Phase::Links,
                    &self.collections.menu_customizations,
                    link_payload(menu_id, customization_id),
                )
                .await?;
            debug!("Linked customization {} to menu item ID: {}", name, menu_id);

            links.push(Link {
                id,
                menu_item: menu_id.clone(),
                customization: (*customization_id).clone(),
            });
        }

        Ok(links)
    }

    async fn create(&self, phase: Phase, collection: &str, payload: Value) -> SeedResult<DocumentId> {
        self.documents
            .create_document(collection, payload)
            .await
            .map_err(|e| SeedError::store(phase, e))
    }
}

fn category_payload(category: &Category) -> Value {
    json!({
        "name": category.name,
        "description": category.description,
    })
}

fn customization_payload(customization: &Customization) -> Value {
    json!({
        "name": customization.name,
        "price": customization.price,
        "type": customization.kind.as_str(),
    })
}

fn menu_item_payload(item: &MenuItem, image_url: &str, category: &DocumentId) -> Value {
    json!({
        "name": item.name,
        "description": item.description,
        "image_url": image_url,
        "price": item.price,
        "rating": item.rating,
        "calories": item.calories,
        "protein": item.protein,
        "categories": category,
    })
}

fn link_payload(menu: &DocumentId, customization: &DocumentId) -> Value {
    json!({
        "menu": menu,
        "customizations": customization,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::CustomizationType;

    #[test]
    fn phase_names() {
        assert_eq!(Phase::Clear.to_string(), "clear");
        assert_eq!(Phase::Links.to_string(), "menu customizations");
    }

    #[test]
    fn payloads_use_app_field_names() {
        let customization = Customization {
            name: "Extra Cheese".to_string(),
            price: 1.5,
            kind: CustomizationType::Topping,
        };
        assert_eq!(
            customization_payload(&customization),
            json!({ "name": "Extra Cheese", "price": 1.5, "type": "topping" })
        );

        let item = MenuItem {
            name: "Margherita".to_string(),
            description: "Tomato and mozzarella".to_string(),
            image_url: "https://example/img.png".to_string(),
            price: 9.5,
            rating: 4.6,
            calories: 800.0,
            protein: 30.0,
            category_name: "Pizza".to_string(),
            customizations: vec!["Extra Cheese".to_string()],
        };
        let payload = menu_item_payload(
            &item,
            "memory://assets/f1/view",
            &DocumentId("cat-1".to_string()),
        );
        assert_eq!(payload["categories"], "cat-1");
        assert_eq!(payload["image_url"], "memory://assets/f1/view");
        assert_eq!(payload["calories"], 800.0);
        assert!(payload.get("category_name").is_none());
        assert!(payload.get("customizations").is_none());

        assert_eq!(
            link_payload(&DocumentId("m".to_string()), &DocumentId("c".to_string())),
            json!({ "menu": "m", "customizations": "c" })
        );
    }
}
