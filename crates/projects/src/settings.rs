//! Tunable bounds for list requests and the post-creation item scan.

use serde::{Deserialize, Serialize};

use crate::ProjectsError;

/// Page sizes and scan bounds used by the readers and coordinators.
///
/// Loaded by the composition root (e.g. from the `[settings]` table of the
/// config file); every field has a default matching the platform's limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Upper bound applied to every caller-supplied page size.
    pub max_page_size: u32,

    /// Page size used when listing fields to resolve a field/option name.
    pub field_lookup_page_size: u32,

    /// Window scanned to find the numeric ID of a freshly added item.
    pub item_scan: ItemScanBound,
}

impl Settings {
    /// The largest page the REST list endpoints serve.
    pub const DEFAULT_MAX_PAGE_SIZE: u32 = 50;

    /// Field lookups ask for this many fields in one page.
    pub const DEFAULT_FIELD_LOOKUP_PAGE_SIZE: u32 = 100;

    /// Rejects bounds that would make a list request or scan meaningless.
    pub fn validate(&self) -> Result<(), ProjectsError> {
        if self.max_page_size == 0 {
            return Err(ProjectsError::validation("settings.max_page_size must be positive"));
        }
        if self.field_lookup_page_size == 0 {
            return Err(ProjectsError::validation(
                "settings.field_lookup_page_size must be positive",
            ));
        }
        if self.item_scan.page_size == 0 || self.item_scan.max_pages == 0 {
            return Err(ProjectsError::validation(
                "settings.item_scan page_size and max_pages must be positive",
            ));
        }
        if self.item_scan.page_size > self.max_page_size {
            return Err(ProjectsError::validation(format!(
                "settings.item_scan.page_size ({}) exceeds max_page_size ({})",
                self.item_scan.page_size, self.max_page_size
            )));
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_page_size: Self::DEFAULT_MAX_PAGE_SIZE,
            field_lookup_page_size: Self::DEFAULT_FIELD_LOOKUP_PAGE_SIZE,
            item_scan: ItemScanBound::default(),
        }
    }
}

/// How far to re-list a project's items when looking for one just added.
///
/// The creation response only exposes the item's node ID, so the numeric ID is
/// found by scanning at most `max_pages × page_size` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemScanBound {
    pub page_size: u32,
    pub max_pages: u32,
}

impl ItemScanBound {
    /// The most items a scan will look at.
    pub fn capacity(self) -> u64 {
        u64::from(self.page_size) * u64::from(self.max_pages)
    }
}

impl Default for ItemScanBound {
    fn default() -> Self {
        Self {
            page_size: 50,
            max_pages: 5,
        }
    }
}
