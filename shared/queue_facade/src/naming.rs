//! Queue name derivation
//!
//! A queue name is `<base name>_<environment>`. The base name is either set
//! explicitly or derived from the host type's path: `billing::InvoiceEvents`
//! becomes `billing_invoice_events`.

use once_cell::sync::Lazy;
use regex::Regex;

static ACRONYM_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z\d]+)([A-Z][a-z])").expect("valid acronym boundary regex"));

static WORD_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z\d])([A-Z])").expect("valid word boundary regex"));

static REFERENCE_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:&|\*const |\*mut |'\w+ |mut |dyn )+").expect("valid reference prefix regex")
});

static INVALID_CHARACTERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9_-]+").expect("valid invalid characters regex"));

/// Converts a `CamelCase` identifier to `snake_case`
#[must_use]
pub fn underscore(identifier: &str) -> String {
    let split = ACRONYM_BOUNDARY.replace_all(identifier, "${1}_${2}");
    let split = WORD_BOUNDARY.replace_all(&split, "${1}_${2}");
    split.replace('-', "_").to_lowercase()
}

/// Normalizes a Rust type path into a queue base name
///
/// Reference and pointer prefixes are stripped, path separators are
/// flattened to `_`, and any remaining character a queue name cannot hold
/// becomes `_`.
///
/// Generic arguments are dropped, so every instantiation of a generic host
/// shares one queue. Give such hosts distinct names through
/// `QueueHost::QUEUE_NAME` or `QueueFacade::with_base_name`.
#[must_use]
pub fn normalize_type_name(type_name: &str) -> String {
    let type_name = REFERENCE_PREFIX.replace(type_name.trim(), "");
    let path = type_name
        .split_once('<')
        .map_or(type_name.as_ref(), |(path, _)| path);

    let joined = path
        .split("::")
        .filter(|segment| !segment.is_empty())
        .map(underscore)
        .collect::<Vec<_>>()
        .join("_");

    INVALID_CHARACTERS
        .replace_all(&joined, "_")
        .trim_matches('_')
        .to_string()
}

/// Base name derived from the type `T`
#[must_use]
pub fn type_base_name<T: ?Sized>() -> String {
    normalize_type_name(std::any::type_name::<T>())
}

/// Joins a base name and an environment tag into a queue name
#[must_use]
pub fn queue_name(base_name: &str, environment: &str) -> String {
    format!("{base_name}_{environment}")
}
