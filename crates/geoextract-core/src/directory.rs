use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::extract::Fields;

/// Field under which points of interest and other plain names are matched.
pub const NAME_FIELD: &str = "name";

/// Read-only source of known location names.
///
/// The pipeline reads the name sets once when it is built and calls
/// [`LocationDirectory::exists`] while validating. Implementations must not
/// change while a pipeline built from them is in use.
pub trait LocationDirectory: Send + Sync {
    /// Fields for which this directory knows names.
    fn fields(&self) -> Vec<String>;

    /// Every literal name (aliases included) known for `field`.
    fn names(&self, field: &str) -> Vec<String>;

    fn exists(&self, field: &str, value: &str) -> bool;

    /// Extra attributes of the location called `name`, if any.
    fn details(&self, _name: &str) -> Option<Fields> {
        None
    }
}

/// One known location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(default, alias = "alias", skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    /// The field this name is valid for, e.g. `street` or `city`. Records
    /// without one are plain names.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Any further keys of the record. Scalars become fields on
    /// augmentation, `null` is ignored.
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl Location {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            kind: None,
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Attributes as field values. Strings are kept verbatim, other values
    /// are written as JSON.
    #[must_use]
    pub fn attribute_fields(&self) -> Fields {
        self.attributes
            .iter()
            .filter_map(|(key, value)| match value {
                Value::Null => None,
                Value::String(text) => Some((key.clone(), text.clone())),
                other => Some((key.clone(), other.to_string())),
            })
            .collect()
    }

    fn field(&self) -> &str {
        self.kind.as_deref().unwrap_or(NAME_FIELD)
    }

    fn spellings(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// In-memory [`LocationDirectory`] backed by a list of [`Location`]s.
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    locations: Vec<Location>,
    by_spelling: HashMap<String, Vec<usize>>,
}

impl Gazetteer {
    #[must_use]
    pub fn new(locations: Vec<Location>) -> Self {
        let mut by_spelling: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, location) in locations.iter().enumerate() {
            for spelling in location.spellings() {
                by_spelling.entry(spelling.to_string()).or_default().push(i);
            }
        }
        Self {
            locations,
            by_spelling,
        }
    }

    /// Parses a JSON array of locations.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    #[must_use]
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    fn lookup(&self, spelling: &str) -> impl Iterator<Item = &Location> {
        self.by_spelling
            .get(spelling)
            .into_iter()
            .flatten()
            .map(|&i| &self.locations[i])
    }
}

impl LocationDirectory for Gazetteer {
    fn fields(&self) -> Vec<String> {
        let kinds: BTreeSet<&str> = self
            .locations
            .iter()
            .filter_map(|location| location.kind.as_deref())
            .collect();
        std::iter::once(NAME_FIELD)
            .chain(kinds.into_iter().filter(|kind| *kind != NAME_FIELD))
            .map(String::from)
            .collect()
    }

    fn names(&self, field: &str) -> Vec<String> {
        self.locations
            .iter()
            .filter(|location| location.field() == field)
            .flat_map(Location::spellings)
            .map(String::from)
            .collect()
    }

    fn exists(&self, field: &str, value: &str) -> bool {
        self.lookup(value).any(|location| location.field() == field)
    }

    fn details(&self, name: &str) -> Option<Fields> {
        self.lookup(name)
            .next()
            .map(Location::attribute_fields)
            .filter(|fields| !fields.is_empty())
    }
}

/// Normalized target names per field, each mapped to its canonical spelling.
#[derive(Debug, Clone, Default)]
pub struct TargetNames {
    fields: BTreeMap<String, BTreeMap<String, String>>,
}

impl TargetNames {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `canonical` under `field` with its normalized form. Blank
    /// names are skipped and the first canonical spelling of a normalized
    /// form wins.
    pub fn insert(&mut self, field: &str, normalized: String, canonical: &str) {
        let normalized = normalized.trim().to_string();
        if normalized.is_empty() {
            return;
        }
        self.fields
            .entry(field.to_string())
            .or_default()
            .entry(normalized)
            .or_insert_with(|| canonical.to_string());
    }

    /// Normalized names known for `field`, in sorted order.
    pub fn normalized(&self, field: &str) -> impl Iterator<Item = &str> {
        self.fields
            .get(field)
            .into_iter()
            .flat_map(|names| names.keys().map(String::as_str))
    }

    #[must_use]
    pub fn canonical(&self, field: &str, normalized: &str) -> Option<&str> {
        self.fields.get(field)?.get(normalized).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self, field: &str) -> usize {
        self.fields.get(field).map_or(0, BTreeMap::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gazetteer() -> Gazetteer {
        Gazetteer::new(vec![
            Location::new("Rathaus")
                .with_alias("Rathaus am Marktplatz")
                .with_attribute("street", "Karl-Friedrich-Straße")
                .with_attribute("house_number", "10"),
            Location::new("Kaiserstraße").with_kind("street"),
            Location::new("Karlsruhe").with_kind("city"),
        ])
    }

    #[test]
    fn test_names_per_field() {
        let g = gazetteer();
        assert_eq!(g.fields(), vec!["name", "city", "street"]);
        assert_eq!(g.names("street"), vec!["Kaiserstraße"]);
        assert_eq!(g.names("city"), vec!["Karlsruhe"]);
        assert_eq!(g.names("name"), vec!["Rathaus", "Rathaus am Marktplatz"]);
        assert!(g.names("postcode").is_empty());
    }

    #[test]
    fn test_exists_checks_type() {
        let g = gazetteer();
        assert!(g.exists("street", "Kaiserstraße"));
        assert!(!g.exists("city", "Kaiserstraße"));
        assert!(!g.exists("street", "Rathaus"));
        assert!(g.exists("name", "Rathaus am Marktplatz"));
        assert!(!g.exists("name", "Kaiserstraße"));
        assert!(!g.exists("street", "unknown"));
    }

    #[test]
    fn test_details() {
        let g = gazetteer();
        let details = g.details("Rathaus am Marktplatz").unwrap();
        assert_eq!(details["house_number"], "10");
        assert!(g.details("Karlsruhe").is_none());
    }

    #[test]
    fn test_from_json() {
        let g = Gazetteer::from_json(
            r#"[
                {"name": "Konzerthaus", "street": "Festplatz", "house_number": "9"},
                {"name": "Karlstraße", "type": "street", "aliases": ["Karlstr"]},
                {"name": "bar", "alias": ["bazinga"]}
            ]"#,
        )
        .unwrap();
        assert_eq!(g.len(), 3);
        assert_eq!(g.locations()[0].attributes["street"], "Festplatz");
        assert_eq!(g.details("Konzerthaus").unwrap()["house_number"], "9");
        assert_eq!(g.locations()[1].kind.as_deref(), Some("street"));
        assert!(g.exists("street", "Karlstr"));
        assert!(g.exists("name", "bazinga"));
    }

    #[test]
    fn test_from_json_with_numeric_attributes() {
        let g = Gazetteer::from_json(
            r#"[{"name": "Rathaus", "house_number": 10, "lat": 49.009, "open": true, "note": null}]"#,
        )
        .unwrap();
        let details = g.details("Rathaus").unwrap();
        assert_eq!(details["house_number"], "10");
        assert_eq!(details["lat"], "49.009");
        assert_eq!(details["open"], "true");
        assert!(!details.contains_key("note"));
    }

    #[test]
    fn test_target_names() {
        let mut names = TargetNames::new();
        names.insert("street", "kaiserstrasse".into(), "Kaiserstraße");
        names.insert("street", "kaiserstrasse".into(), "Kaiser-Straße");
        names.insert("street", "   ".into(), "blank");
        assert_eq!(names.len("street"), 1);
        assert_eq!(names.canonical("street", "kaiserstrasse"), Some("Kaiserstraße"));
        assert_eq!(names.normalized("street").collect::<Vec<_>>(), vec!["kaiserstrasse"]);
        assert_eq!(names.normalized("city").count(), 0);
    }
}
