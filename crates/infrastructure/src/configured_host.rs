//! Host collaborators backed by static configuration.

use async_trait::async_trait;

use tablekeeper_application::{ExtensionRegistry, PlatformProfile};
use tablekeeper_core::AppResult;
use tablekeeper_domain::{DEFAULT_CORE_TABLES, NamespacePrefix};

/// Extension registry whose entries come from configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredExtensionRegistry {
    active: Vec<String>,
    always_on: Vec<String>,
}

impl ConfiguredExtensionRegistry {
    /// Creates a registry from raw entries such as `shop/shop.php` and
    /// always-on file paths such as `/srv/site/mu-plugins/cache/loader.php`.
    #[must_use]
    pub fn new(active: Vec<String>, always_on: Vec<String>) -> Self {
        Self {
            active: without_blanks(active),
            always_on: without_blanks(always_on),
        }
    }
}

fn without_blanks(entries: Vec<String>) -> Vec<String> {
    entries
        .into_iter()
        .map(|entry| entry.trim().to_owned())
        .filter(|entry| !entry.is_empty())
        .collect()
}

#[async_trait]
impl ExtensionRegistry for ConfiguredExtensionRegistry {
    async fn active_extensions(&self) -> AppResult<Vec<String>> {
        Ok(self.active.clone())
    }

    async fn always_on_extensions(&self) -> AppResult<Vec<String>> {
        Ok(self.always_on.clone())
    }
}

/// Platform profile with a fixed prefix and core table list.
#[derive(Debug, Clone)]
pub struct ConfiguredPlatformProfile {
    prefix: NamespacePrefix,
    core_tables: Vec<String>,
}

impl ConfiguredPlatformProfile {
    /// Creates a profile. An empty core list falls back to the platform defaults.
    #[must_use]
    pub fn new(prefix: NamespacePrefix, core_tables: Vec<String>) -> Self {
        let core_tables = without_blanks(core_tables);
        let core_tables = if core_tables.is_empty() {
            DEFAULT_CORE_TABLES
                .iter()
                .map(|name| (*name).to_owned())
                .collect()
        } else {
            core_tables
        };

        Self {
            prefix,
            core_tables,
        }
    }
}

impl PlatformProfile for ConfiguredPlatformProfile {
    fn namespace_prefix(&self) -> &NamespacePrefix {
        &self.prefix
    }

    fn core_table_names(&self) -> Vec<String> {
        self.core_tables.clone()
    }
}
