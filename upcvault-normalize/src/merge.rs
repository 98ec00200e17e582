//! First-non-empty-wins merge of raw payload items.

use upcvault_core::record::fields;
use upcvault_core::{CanonicalRecord, FieldValue, ProductKey, RawItem, RawPayload};

/// Known scalar fields: canonical name plus accepted source aliases, in
/// the order they are consulted within one item.
const SCALAR_FIELDS: &[(&str, &[&str])] = &[
    (fields::TITLE, &["title"]),
    (fields::BRAND, &["brand"]),
    (fields::MODEL, &["model", "mpn"]),
    (fields::DESCRIPTION, &["description", "description_full"]),
    (fields::COLOR, &["color"]),
    (fields::SIZE, &["size"]),
    (fields::DIMENSIONS, &["dimension", "dimensions"]),
    (fields::WEIGHT, &["weight"]),
    (fields::CATEGORY, &["category"]),
    (fields::CURRENCY, &["currency", "currency_symbol"]),
    (fields::LOWEST_PRICE, &["lowest_recorded_price"]),
    (fields::HIGHEST_PRICE, &["highest_recorded_price"]),
    (fields::UPC, &["upc", "ean"]),
];

/// Source fields that never reach the generic passthrough: either they
/// are consumed by a dedicated pass above, or they are offer/price-listing
/// detail that is always excluded.
const PASSTHROUGH_EXCLUDED: &[&str] = &[
    "title",
    "brand",
    "model",
    "mpn",
    "description",
    "description_full",
    "color",
    "size",
    "dimension",
    "dimensions",
    "weight",
    "category",
    "category_path",
    "currency",
    "currency_symbol",
    "lowest_recorded_price",
    "highest_recorded_price",
    "upc",
    "ean",
    "images",
    "offers",
];

/// Separator used when `category` falls back to the `category_path` array.
const CATEGORY_PATH_SEPARATOR: &str = " > ";

/// Merge a raw payload into one canonical record for `key`.
///
/// An already-flat payload (no `items` wrapper) passes through the same
/// pipeline and comes out unchanged apart from the strip pass, which makes
/// the operation idempotent on canonical input.
pub fn normalize(payload: &RawPayload, key: &ProductKey) -> CanonicalRecord {
    let items = payload.items();
    let mut record = CanonicalRecord::new();

    // Pass 1: known scalar fields, first-non-empty-wins in source order.
    for item in &items {
        for &(canonical, aliases) in SCALAR_FIELDS {
            if record.contains(canonical) {
                continue;
            }
            if let Some(value) = first_scalar(item, aliases) {
                record.set_if_absent(canonical, value);
            }
        }
    }

    // Pass 2: images union across ALL items, first-seen order, exact dedup.
    let mut images: Vec<String> = Vec::new();
    for item in &items {
        for url in item.string_list(fields::IMAGES).unwrap_or_default() {
            if !url.trim().is_empty() && !images.contains(&url) {
                images.push(url);
            }
        }
    }
    if !images.is_empty() {
        record.insert(fields::IMAGES, FieldValue::List(images));
    }

    // Pass 3: category falls back to the joined category_path array.
    if !record.contains(fields::CATEGORY) {
        for item in &items {
            let joined = item
                .string_list("category_path")
                .map(|parts| {
                    parts
                        .into_iter()
                        .filter(|p| !p.trim().is_empty())
                        .collect::<Vec<_>>()
                        .join(CATEGORY_PATH_SEPARATOR)
                })
                .unwrap_or_default();
            if record.set_if_absent(fields::CATEGORY, joined.into()) {
                break;
            }
        }
    }

    // Pass 4: generic passthrough for unanticipated source fields.
    for item in &items {
        for (name, value) in item.entries() {
            if PASSTHROUGH_EXCLUDED.contains(&name.as_str()) {
                continue;
            }
            if let Some(converted) = FieldValue::from_json(value) {
                record.set_if_absent(name, converted);
            }
        }
    }

    // The identifier field always equals the cache key.
    record.insert(fields::UPC, FieldValue::Text(key.to_string()));

    // Pass 5: strip empties.
    record.strip_empty();
    record
}

/// First non-empty scalar among the aliases on one item.
///
/// Lists are not accepted here; array-valued fields are either `images`
/// (pass 2), `category_path` (pass 3), or passthrough material (pass 4).
fn first_scalar(item: &RawItem<'_>, aliases: &[&str]) -> Option<FieldValue> {
    for alias in aliases {
        let value = match item.get(alias) {
            Some(v) => v,
            None => continue,
        };
        match FieldValue::from_json(value) {
            Some(FieldValue::List(_)) | None => continue,
            Some(scalar) if scalar.is_empty() => continue,
            Some(scalar) => return Some(scalar),
        }
    }
    None
}

// =============================================================================
// TESTS
// =============================================================================
