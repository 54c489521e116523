//! Shared domain types for the canonical product record.
//!
//! Everything that is keyed per storefront lives in a [`SiteMap`], a thin
//! wrapper over `BTreeMap<SiteKey, T>` whose [`SiteMap::merge_from`] is the
//! only sanctioned way to fold freshly synced values into an existing map.
//! Overwriting a whole map would silently drop other sites' entries.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of one storefront (e.g. `"com"`, `"uk"`, `"de"`, `"fr"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteKey(String);

impl SiteKey {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SiteKey {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A per-site value map stored as one JSONB column on the product row.
///
/// Partial updates must go through [`SiteMap::merge_from`] (or the equivalent
/// `||` merge in SQL); replacing the map wholesale is a bug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteMap<T>(pub BTreeMap<SiteKey, T>);

impl<T> Default for SiteMap<T> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<T> SiteMap<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn single(site: SiteKey, value: T) -> Self {
        let mut map = BTreeMap::new();
        map.insert(site, value);
        Self(map)
    }

    #[must_use]
    pub fn get(&self, site: &SiteKey) -> Option<&T> {
        self.0.get(site)
    }

    pub fn insert(&mut self, site: SiteKey, value: T) -> Option<T> {
        self.0.insert(site, value)
    }

    pub fn remove(&mut self, site: &SiteKey) -> Option<T> {
        self.0.remove(site)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SiteKey, &T)> {
        self.0.iter()
    }

    /// Folds `other` into `self`, overwriting only the sites present in
    /// `other`. Entries for any other site are left untouched.
    pub fn merge_from(&mut self, other: SiteMap<T>) {
        for (site, value) in other.0 {
            self.0.insert(site, value);
        }
    }
}

impl<T> FromIterator<(SiteKey, T)> for SiteMap<T> {
    fn from_iter<I: IntoIterator<Item = (SiteKey, T)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Per-(product, site) ledger state. A missing entry reads as `NotPublished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Synced,
    Pending,
    Error,
    Deleted,
    NotPublished,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncStatus::Synced => "synced",
            SyncStatus::Pending => "pending",
            SyncStatus::Error => "error",
            SyncStatus::Deleted => "deleted",
            SyncStatus::NotPublished => "not_published",
        };
        f.write_str(s)
    }
}

/// Which field groups a sync run is allowed to touch on the remote side.
///
/// The default selection is everything except images; image relocation is
/// expensive and therefore opt-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSelection {
    pub content: bool,
    pub status: bool,
    pub stock: bool,
    pub price: bool,
    pub categories: bool,
    pub images: bool,
}

impl Default for FieldSelection {
    fn default() -> Self {
        Self {
            content: true,
            status: true,
            stock: true,
            price: true,
            categories: true,
            images: false,
        }
    }
}

impl FieldSelection {
    /// Every field group including images.
    #[must_use]
    pub fn all() -> Self {
        Self {
            images: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn none() -> Self {
        Self {
            content: false,
            status: false,
            stock: false,
            price: false,
            categories: false,
            images: false,
        }
    }

    #[must_use]
    pub fn any(&self) -> bool {
        self.content || self.status || self.stock || self.price || self.categories || self.images
    }
}

impl FromStr for FieldSelection {
    type Err = String;

    /// Parses a comma-separated field list, e.g. `"stock,price"`.
    ///
    /// `"default"` is everything except images; `"all"` includes images.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "default" => return Ok(Self::default()),
            "all" => return Ok(Self::all()),
            _ => {}
        }
        let mut selection = Self::none();
        for field in s.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            match field {
                "content" | "name" | "description" => selection.content = true,
                "status" => selection.status = true,
                "stock" => selection.stock = true,
                "price" => selection.price = true,
                "categories" => selection.categories = true,
                "images" => selection.images = true,
                other => return Err(format!("unknown sync field: '{other}'")),
            }
        }
        if !selection.any() {
            return Err("empty field selection".to_owned());
        }
        Ok(selection)
    }
}

/// Shared (site-independent) product attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleeve: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<String>,
}

impl ProductAttributes {
    /// Maps remote attribute `(name, options)` pairs onto the canonical
    /// attribute set. Remote attribute names vary per site theme
    /// (`"Gender/Age"` vs `"gender"`, `"Jersey Type"` vs `"type"`), so names
    /// are compared lowercased with spaces and slashes stripped.
    #[must_use]
    pub fn from_remote_pairs(pairs: &[(String, Vec<String>)]) -> Self {
        let mut attrs = Self::default();
        for (name, options) in pairs {
            let normalized: String = name
                .to_lowercase()
                .chars()
                .filter(|c| !c.is_whitespace() && *c != '/' && *c != '-')
                .collect();
            let first = options.first().cloned();
            match normalized.as_str() {
                "genderage" | "gender" => attrs.gender = first,
                "season" => attrs.season = first,
                "jerseytype" | "type" => attrs.kind = first,
                "style" | "version" => attrs.version = first,
                "sleevelength" | "sleeve" => attrs.sleeve = first,
                "team" => attrs.team = first,
                "event" | "events" => attrs.events = options.clone(),
                _ => {}
            }
        }
        attrs
    }

    /// The gender used for size derivation, falling back to [`DEFAULT_GENDER`].
    #[must_use]
    pub fn gender_or_default(&self) -> &str {
        self.gender.as_deref().unwrap_or(DEFAULT_GENDER)
    }
}

/// Per-site localized marketing copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedContent {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: String,
}

/// One purchasable size variant as stored on the canonical record, scoped to
/// a (product, site) pair. Owned by the Variation Manager: created and
/// destroyed in bulk, never edited individually.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Variation {
    #[serde(default)]
    pub remote_id: i64,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub regular_price: String,
    #[serde(default)]
    pub sale_price: String,
    #[serde(default)]
    pub stock_quantity: Option<i64>,
    #[serde(default)]
    pub stock_status: String,
    /// Ordered `(attribute name, option)` pairs, e.g. `("Size", "XL")`.
    #[serde(default)]
    pub attribute_options: Vec<(String, String)>,
}

/// Gender applied when a product has none set.
pub const DEFAULT_GENDER: &str = "Men's";

/// Adult size run, used for every gender that is not a child gender.
pub const ADULT_SIZES: [&str; 5] = ["S", "M", "L", "XL", "2XL"];

/// Youth numeric size run.
pub const CHILD_SIZES: [&str; 6] = ["16", "18", "20", "22", "24", "26"];

/// The size run for a gender value. Pure function: `"Kids'"`, `"Youth"` and
/// similar map to [`CHILD_SIZES`]; everything else is [`ADULT_SIZES`].
#[must_use]
pub fn size_set_for_gender(gender: &str) -> &'static [&'static str] {
    let lower = gender.to_lowercase();
    if lower.contains("kid") || lower.contains("youth") || lower.contains("child") {
        &CHILD_SIZES
    } else {
        &ADULT_SIZES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_map_merge_preserves_other_sites() {
        let mut map: SiteMap<i64> = [(SiteKey::from("com"), 10), (SiteKey::from("uk"), 20)]
            .into_iter()
            .collect();
        map.merge_from(SiteMap::single(SiteKey::from("uk"), 99));

        assert_eq!(map.get(&SiteKey::from("com")), Some(&10));
        assert_eq!(map.get(&SiteKey::from("uk")), Some(&99));
    }

    #[test]
    fn site_map_serializes_as_plain_object() {
        let map = SiteMap::single(SiteKey::from("de"), 42);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"de":42}"#);
    }

    #[test]
    fn sync_status_round_trips_snake_case() {
        let json = serde_json::to_string(&SyncStatus::NotPublished).unwrap();
        assert_eq!(json, r#""not_published""#);
        let parsed: SyncStatus = serde_json::from_str(r#""synced""#).unwrap();
        assert_eq!(parsed, SyncStatus::Synced);
    }

    #[test]
    fn default_field_selection_excludes_images() {
        let fields = FieldSelection::default();
        assert!(fields.content && fields.status && fields.stock);
        assert!(fields.price && fields.categories);
        assert!(!fields.images);
    }

    #[test]
    fn field_selection_parses_subset() {
        let fields: FieldSelection = "stock,price".parse().unwrap();
        assert!(fields.stock && fields.price);
        assert!(!fields.content && !fields.status && !fields.categories && !fields.images);
    }

    #[test]
    fn field_selection_rejects_unknown_field() {
        let result: Result<FieldSelection, _> = "stock,banana".parse();
        assert!(result.is_err());
    }

    #[test]
    fn attributes_map_remote_names() {
        let pairs = vec![
            ("Gender/Age".to_owned(), vec!["Men's".to_owned()]),
            ("Jersey Type".to_owned(), vec!["Home".to_owned()]),
            ("Season".to_owned(), vec!["24/25".to_owned()]),
            (
                "Events".to_owned(),
                vec!["League".to_owned(), "Cup".to_owned()],
            ),
        ];
        let attrs = ProductAttributes::from_remote_pairs(&pairs);
        assert_eq!(attrs.gender.as_deref(), Some("Men's"));
        assert_eq!(attrs.kind.as_deref(), Some("Home"));
        assert_eq!(attrs.season.as_deref(), Some("24/25"));
        assert_eq!(attrs.events, vec!["League", "Cup"]);
    }

    #[test]
    fn gender_defaults_when_unset() {
        let attrs = ProductAttributes::default();
        assert_eq!(attrs.gender_or_default(), DEFAULT_GENDER);
    }

    #[test]
    fn size_set_adult_for_mens() {
        assert_eq!(size_set_for_gender("Men's"), &ADULT_SIZES);
    }

    #[test]
    fn size_set_child_for_kids() {
        assert_eq!(size_set_for_gender("Kids'"), &CHILD_SIZES);
        assert_eq!(size_set_for_gender("Youth"), &CHILD_SIZES);
    }

    #[test]
    fn unknown_gender_falls_back_to_adult() {
        assert_eq!(size_set_for_gender("Women's"), &ADULT_SIZES);
    }
}
