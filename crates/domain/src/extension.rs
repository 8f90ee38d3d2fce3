use std::fmt::{Display, Formatter};
use std::path::Path;

use tablekeeper_core::{AppError, AppResult};

/// Normalized extension slug used as a table-name prefix key.
///
/// Hyphens are replaced with underscores so `my-shop` claims tables such as
/// `my_shop_orders`. Matching is a plain `starts_with` on the local table
/// name, which means `shop` also claims `shopcart_orders`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExtensionIdentifier(String);

impl ExtensionIdentifier {
    /// Normalizes a raw slug.
    pub fn new(slug: &str) -> AppResult<Self> {
        let normalized = slug.trim().replace('-', "_");
        if normalized.is_empty() {
            return Err(AppError::Validation(
                "extension slug must not be empty".to_owned(),
            ));
        }

        Ok(Self(normalized))
    }

    /// Derives the slug from a standard registry entry such as `my-shop/my-shop.php`.
    ///
    /// Single-file entries have no directory and therefore claim no tables.
    #[must_use]
    pub fn from_registry_entry(entry: &str) -> Option<Self> {
        let (directory, _) = entry.trim().rsplit_once('/')?;
        Self::new(directory).ok()
    }

    /// Derives the slug from an always-on extension file path.
    ///
    /// The slug is the name of the directory holding the file, so a loader
    /// placed directly in the always-on directory yields that directory's name.
    #[must_use]
    pub fn from_always_on_path(path: &str) -> Option<Self> {
        let directory = Path::new(path.trim()).parent()?.file_name()?.to_str()?;
        Self::new(directory).ok()
    }

    /// Returns the normalized slug.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns whether a local (prefix-stripped) table name belongs to this extension.
    #[must_use]
    pub fn claims(&self, local_table_name: &str) -> bool {
        local_table_name.starts_with(self.0.as_str())
    }
}

impl Display for ExtensionIdentifier {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}
