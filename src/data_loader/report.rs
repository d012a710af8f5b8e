use indexmap::IndexMap;
use tracing::info;

use super::NameIndex;
use crate::images::ImageResolution;
use crate::store::DocumentId;

/// What the clear phase removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClearReport {
    pub documents: IndexMap<String, usize>,
    pub files: usize,
}

impl ClearReport {
    pub fn documents_deleted(&self) -> usize {
        self.documents.values().sum()
    }
}

/// One menu item to customization join record.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: DocumentId,
    pub menu_item: DocumentId,
    pub customization: DocumentId,
}

#[derive(Debug)]
pub struct ImageOutcome {
    pub item: String,
    pub resolution: ImageResolution,
}

/// Output of the menu item phase.
#[derive(Debug, Default)]
pub struct MenuPhaseOutput {
    /// Latest id per name, for lookups.
    pub menu: NameIndex,
    /// Every created menu item in creation order, repeated names included.
    pub menu_items: Vec<DocumentId>,
    pub links: Vec<Link>,
    pub images: Vec<ImageOutcome>,
}

#[derive(Debug)]
pub struct SeedReport {
    pub cleared: ClearReport,
    pub categories: NameIndex,
    pub customizations: NameIndex,
    pub menu: NameIndex,
    pub menu_items: Vec<DocumentId>,
    pub links: Vec<Link>,
    pub images: Vec<ImageOutcome>,
}

impl SeedReport {
    pub fn uploaded_images(&self) -> usize {
        self.images
            .iter()
            .filter(|outcome| !outcome.resolution.is_fallback())
            .count()
    }

    pub fn fallback_images(&self) -> usize {
        self.images
            .iter()
            .filter(|outcome| outcome.resolution.is_fallback())
            .count()
    }

    pub fn log_summary(&self) {
        info!(
            "Cleared {} documents and {} files",
            self.cleared.documents_deleted(),
            self.cleared.files
        );
        info!(
            "Created {} categories, {} customizations, {} menu items, {} links",
            self.categories.len(),
            self.customizations.len(),
            self.menu_items.len(),
            self.links.len()
        );
        info!(
            "Images: {} uploaded, {} using fallback",
            self.uploaded_images(),
            self.fallback_images()
        );
    }
}
