use tablekeeper_domain::{DEFAULT_CORE_TABLES, IDENTITY_TABLES, NamespacePrefix};
use tablekeeper_infrastructure::InMemoryCatalogRepository;

/// Leftover extension tables: `(local name, rows, size in bytes)`.
const DEV_SEED_ORPHAN_TABLES: [(&str, u64, Option<u64>); 5] = [
    ("shop_orders", 1_284, Some(2_621_440)),
    ("shop_order_items", 5_902, Some(6_815_744)),
    ("contact_form_entries", 311, Some(425_984)),
    ("legacy_gallery_images", 48, Some(81_920)),
    ("redirect_log", 90_211, None),
];

const DEV_SEED_FOREIGN_TABLES: [&str; 2] = ["site2_posts", "analytics_events"];

/// Builds a catalog shaped like a small installation with some orphaned tables.
pub fn seeded_catalog(prefix: &NamespacePrefix) -> InMemoryCatalogRepository {
    let platform_tables = DEFAULT_CORE_TABLES
        .iter()
        .chain(IDENTITY_TABLES.iter())
        .map(|local_name| (prefix.qualify(local_name), 25, Some(65_536)));
    let orphan_tables = DEV_SEED_ORPHAN_TABLES
        .iter()
        .map(|(local_name, rows, size)| (prefix.qualify(local_name), *rows, *size));
    let foreign_tables = DEV_SEED_FOREIGN_TABLES
        .iter()
        .map(|name| ((*name).to_owned(), 10, Some(16_384)));

    InMemoryCatalogRepository::with_tables(
        platform_tables.chain(orphan_tables).chain(foreign_tables),
    )
}
