//! The domain object: the one record shape every Plinth tenant persists.
//!
//! # Design
//!
//! Plinth is schema-light. Instead of one struct per entity, every persisted
//! record is a [`DomainObject`]: a fixed envelope (id, type tag, tenant,
//! name, lineage, timestamps, tags, write-path flags) around an open property
//! bag of JSON values. The bag is `#[serde(flatten)]`ed, so unknown fields in
//! incoming JSON land in it and flatten back out on serialization; consumers
//! that want richer typing layer it on top of the bag.
//!
//! The three flags (`is_stored`, `is_indexed`, `is_cached`) are independent
//! opt-outs read by the write path in `plinth-store`. All default to true.

use crate::registry::{normalize_tag, TypeRegistry, GENERIC_TYPE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Timestamp type used across Plinth.
pub type Timestamp = DateTime<Utc>;

/// A single persisted record, scoped to a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainObject {
    /// Object id. Empty until assigned by the write path or the durable
    /// store; non-empty once the object has been persisted anywhere.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Type tag, lowercase. Resolvable through the [`TypeRegistry`], with
    /// unrecognized tags handled by the generic catch-all.
    #[serde(rename = "type", default = "default_type_tag")]
    pub type_tag: String,

    /// Tenant scope. Stamped from the operation's tenant argument on first
    /// write when the caller leaves it empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tenant_id: String,

    /// Human-readable label, 1 to 255 characters.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Optional parent object id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// Who created the object. Set by the caller before the first write;
    /// the write path never overwrites it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<String>,

    /// Set exactly once, at the first persisted write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,

    /// Advanced on every persisted write, never moved backwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,

    /// Ordered tags: non-blank, deduplicated, first occurrence wins.
    /// Private so the cleaning rules in [`add_tags`](Self::add_tags) cannot
    /// be bypassed.
    #[serde(
        default,
        deserialize_with = "deserialize_tags",
        skip_serializing_if = "Vec::is_empty"
    )]
    tags: Vec<String>,

    /// Whether the object is written to the durable store.
    #[serde(default = "default_true")]
    pub is_stored: bool,

    /// Whether the object is written to the search index.
    #[serde(default = "default_true")]
    pub is_indexed: bool,

    /// Whether the object participates in caching.
    #[serde(default = "default_true")]
    pub is_cached: bool,

    /// Open property bag. Flattened: unknown JSON fields land here and
    /// serialize back to the top level.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

fn default_true() -> bool {
    true
}

fn default_type_tag() -> String {
    GENERIC_TYPE.to_string()
}

/// Drop blanks and duplicates while preserving first-occurrence order.
/// Tolerates `null` for the whole array and for individual entries.
fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Option<String>>>::deserialize(deserializer)?.unwrap_or_default();
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.into_iter().flatten() {
        let tag = tag.trim();
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    Ok(tags)
}

impl DomainObject {
    /// Create an object of the given type with defaults: no id, no tenant,
    /// all three write-path flags on, the type tag as its name.
    pub fn new(type_tag: &str) -> Self {
        let tag = normalize_tag(type_tag);
        let tag = if tag.is_empty() {
            GENERIC_TYPE.to_string()
        } else {
            tag
        };
        Self {
            id: String::new(),
            name: tag.clone(),
            type_tag: tag,
            tenant_id: String::new(),
            parent_id: None,
            creator_id: None,
            created_at: None,
            updated_at: None,
            tags: Vec::new(),
            is_stored: true,
            is_indexed: true,
            is_cached: true,
            properties: Map::new(),
        }
    }

    /// Create an object with a caller-chosen id.
    pub fn with_id(type_tag: &str, id: &str) -> Self {
        let mut object = Self::new(type_tag);
        object.id = id.to_string();
        object
    }

    /// The object's tags, in insertion order.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Replace all tags. Blanks are dropped and duplicates collapse to the
    /// first occurrence; an empty iterator clears the tags.
    pub fn set_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags.clear();
        self.add_tags(tags);
    }

    /// Append tags, applying the same cleaning rules as
    /// [`set_tags`](Self::set_tags).
    pub fn add_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in tags {
            let tag = tag.as_ref().trim();
            if !tag.is_empty() && !self.tags.iter().any(|t| t == tag) {
                self.tags.push(tag.to_string());
            }
        }
    }

    /// Remove the given tags; unknown and blank entries are ignored.
    pub fn remove_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let remove: Vec<String> = tags
            .into_iter()
            .filter_map(|t| {
                let t = t.as_ref().trim();
                if t.is_empty() {
                    None
                } else {
                    Some(t.to_string())
                }
            })
            .collect();
        self.tags.retain(|t| !remove.contains(t));
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag.trim())
    }

    /// Read a property-bag value.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Set a property-bag value.
    pub fn set_property(&mut self, name: &str, value: impl Into<Value>) {
        self.properties.insert(name.to_string(), value.into());
    }

    /// Remove a property-bag value, returning it if present.
    pub fn remove_property(&mut self, name: &str) -> Option<Value> {
        self.properties.remove(name)
    }

    /// Stamp identity and timestamps ahead of a persisted write.
    ///
    /// Assigns a fresh id when missing, fills an empty tenant from the
    /// operation scope, sets `created_at` exactly once, and advances
    /// `updated_at` monotonically: a previously stamped value is never
    /// moved backwards, even across clock skew.
    pub fn prepare_for_write(&mut self, tenant_id: &str) {
        if self.id.is_empty() {
            self.id = crate::new_object_id();
        }
        if self.tenant_id.is_empty() {
            self.tenant_id = tenant_id.to_string();
        }
        let now = Utc::now();
        if self.created_at.is_none() {
            self.created_at = Some(now);
        }
        self.updated_at = Some(match self.updated_at {
            Some(previous) if previous > now => previous,
            _ => now,
        });
    }

    /// Serialize to JSON, property bag flattened to the top level.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON and normalize the type tag through the
    /// registry, so blank or unrecognized tags resolve the way the
    /// catch-all type does. Unknown fields land in the property bag.
    pub fn from_json(registry: &TypeRegistry, json: &str) -> serde_json::Result<Self> {
        let mut object: Self = serde_json::from_str(json)?;
        registry.check_and_fix_type(&mut object);
        Ok(object)
    }
}

impl Default for DomainObject {
    fn default() -> Self {
        Self::new(GENERIC_TYPE)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_object_defaults() {
        let object = DomainObject::new("note");
        assert_eq!(object.type_tag, "note");
        assert_eq!(object.name, "note");
        assert!(object.id.is_empty());
        assert!(object.tenant_id.is_empty());
        assert!(object.is_stored);
        assert!(object.is_indexed);
        assert!(object.is_cached);
        assert!(object.tags().is_empty());
        assert!(object.created_at.is_none());
    }

    #[test]
    fn test_type_tag_is_normalized() {
        let object = DomainObject::new("  Note ");
        assert_eq!(object.type_tag, "note");

        let blank = DomainObject::new("   ");
        assert_eq!(blank.type_tag, GENERIC_TYPE);
    }

    #[test]
    fn test_add_tags_dedupes_and_drops_blanks() {
        let mut object = DomainObject::new("note");
        object.add_tags(["one", "two", "three"]);
        assert_eq!(object.tags(), ["one", "two", "three"]);

        object.add_tags(["two", "  ", "", "four"]);
        assert_eq!(object.tags(), ["one", "two", "three", "four"]);

        object.add_tags(["  one  "]);
        assert_eq!(object.tags().len(), 4);
    }

    #[test]
    fn test_remove_tags() {
        let mut object = DomainObject::new("note");
        object.set_tags(["one", "two", "three"]);
        object.remove_tags(["two", "missing", " "]);
        assert_eq!(object.tags(), ["one", "three"]);
        assert!(!object.has_tag("two"));
        assert!(object.has_tag("one"));
    }

    #[test]
    fn test_set_tags_replaces() {
        let mut object = DomainObject::new("note");
        object.set_tags(["a", "b"]);
        object.set_tags(["c"]);
        assert_eq!(object.tags(), ["c"]);
        object.set_tags(Vec::<String>::new());
        assert!(object.tags().is_empty());
    }

    #[test]
    fn test_property_accessors() {
        let mut object = DomainObject::new("note");
        object.set_property("views", 42);
        object.set_property("title", "hello");
        assert_eq!(object.property("views"), Some(&json!(42)));
        assert_eq!(object.property("title"), Some(&json!("hello")));
        assert_eq!(object.remove_property("views"), Some(json!(42)));
        assert!(object.property("views").is_none());
    }

    #[test]
    fn test_prepare_assigns_identity_once() {
        let mut object = DomainObject::new("note");
        object.prepare_for_write("tenant-a");
        let id = object.id.clone();
        let created = object.created_at;
        assert!(!id.is_empty());
        assert_eq!(object.tenant_id, "tenant-a");
        assert!(created.is_some());

        object.prepare_for_write("tenant-b");
        assert_eq!(object.id, id);
        assert_eq!(object.tenant_id, "tenant-a");
        assert_eq!(object.created_at, created);
    }

    #[test]
    fn test_prepare_never_regresses_updated_at() {
        let mut object = DomainObject::new("note");
        let future = Utc::now() + chrono::Duration::days(30);
        object.updated_at = Some(future);
        object.prepare_for_write("tenant-a");
        assert_eq!(object.updated_at, Some(future));

        let mut fresh = DomainObject::new("note");
        fresh.prepare_for_write("tenant-a");
        let first = fresh.updated_at;
        fresh.prepare_for_write("tenant-a");
        assert!(fresh.updated_at >= first);
    }

    #[test]
    fn test_creator_is_left_alone() {
        let mut object = DomainObject::new("note");
        object.creator_id = Some("user-1".to_string());
        object.prepare_for_write("tenant-a");
        object.prepare_for_write("tenant-a");
        assert_eq!(object.creator_id.as_deref(), Some("user-1"));
    }

    #[test]
    fn test_serializes_camel_case_with_flattened_bag() {
        let mut object = DomainObject::with_id("note", "n1");
        object.tenant_id = "tenant-a".to_string();
        object.set_property("wordCount", 120);
        object.add_tags(["draft"]);

        let value: Value = serde_json::from_str(&object.to_json().unwrap()).unwrap();
        assert_eq!(value["id"], json!("n1"));
        assert_eq!(value["type"], json!("note"));
        assert_eq!(value["tenantId"], json!("tenant-a"));
        assert_eq!(value["isStored"], json!(true));
        assert_eq!(value["tags"], json!(["draft"]));
        // Flattened, not nested under a "properties" key.
        assert_eq!(value["wordCount"], json!(120));
        assert!(value.get("properties").is_none());
    }

    #[test]
    fn test_missing_flags_default_true() {
        let registry = TypeRegistry::new();
        let object =
            DomainObject::from_json(&registry, r#"{"type":"note","name":"n"}"#).unwrap();
        assert!(object.is_stored);
        assert!(object.is_indexed);
        assert!(object.is_cached);
    }

    #[test]
    fn test_unknown_json_fields_land_in_bag() {
        let registry = TypeRegistry::new();
        let object = DomainObject::from_json(
            &registry,
            r#"{"type":"note","name":"n","customField":42,"nested":{"a":1}}"#,
        )
        .unwrap();
        assert_eq!(object.property("customField"), Some(&json!(42)));
        assert_eq!(object.property("nested"), Some(&json!({"a": 1})));

        let round: Value = serde_json::from_str(&object.to_json().unwrap()).unwrap();
        assert_eq!(round["customField"], json!(42));
    }

    #[test]
    fn test_tags_cleaned_on_decode() {
        let registry = TypeRegistry::new();
        let object = DomainObject::from_json(
            &registry,
            r#"{"type":"note","tags":[" a", null, "a", "", "b"]}"#,
        )
        .unwrap();
        assert_eq!(object.tags(), ["a", "b"]);

        let null_tags =
            DomainObject::from_json(&registry, r#"{"type":"note","tags":null}"#).unwrap();
        assert!(null_tags.tags().is_empty());
    }

    #[test]
    fn test_blank_type_resolves_to_catch_all_on_decode() {
        let registry = TypeRegistry::new();
        let object = DomainObject::from_json(&registry, r#"{"name":"n"}"#).unwrap();
        assert_eq!(object.type_tag, GENERIC_TYPE);
    }

    #[test]
    fn test_json_round_trip_with_timestamps() {
        let registry = TypeRegistry::new();
        let mut object = DomainObject::with_id("note", "n1");
        object.prepare_for_write("tenant-a");
        object.set_property("body", "text");
        object.add_tags(["x", "y"]);

        let round =
            DomainObject::from_json(&registry, &object.to_json().unwrap()).unwrap();
        assert_eq!(round, object);
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_raw_tag() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            Just("   ".to_string()),
            "[a-z]{1,6}",
            " [a-z]{1,4} ",
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Tags never contain blanks or duplicates, whatever the input.
        #[test]
        fn prop_tags_stay_clean(raw in prop::collection::vec(arb_raw_tag(), 0..12)) {
            let mut object = DomainObject::new("note");
            object.set_tags(raw);
            for tag in object.tags() {
                prop_assert!(!tag.trim().is_empty());
                prop_assert_eq!(tag.trim(), tag.as_str());
            }
            let mut seen = std::collections::HashSet::new();
            for tag in object.tags() {
                prop_assert!(seen.insert(tag.clone()), "duplicate tag {}", tag);
            }
        }

        /// Serialization round trips preserve the object exactly.
        #[test]
        fn prop_json_round_trip(
            type_tag in "[a-z]{3,10}",
            name in "[A-Za-z0-9][A-Za-z0-9 ]{0,30}",
            stored in any::<bool>(),
            indexed in any::<bool>(),
            cached in any::<bool>(),
            views in any::<i32>(),
        ) {
            let registry = TypeRegistry::new();
            let mut object = DomainObject::new(&type_tag);
            object.name = name;
            object.is_stored = stored;
            object.is_indexed = indexed;
            object.is_cached = cached;
            object.set_property("views", views);
            object.prepare_for_write("tenant-a");

            let json = object.to_json().unwrap();
            let round = DomainObject::from_json(&registry, &json).unwrap();
            prop_assert_eq!(round, object);
        }
    }
}
