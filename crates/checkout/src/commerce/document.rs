//! JSON:API wire layer.
//!
//! The commerce API returns compound documents: a primary resource (or
//! list) plus an `included` array holding every related resource requested
//! via `?include=`. Relationships carry only `{type, id}` linkage; the
//! [`ResourceIndex`] resolves linkage against the included set so typed
//! resources can be assembled without further round trips.

use std::collections::HashMap;

use serde::Deserialize;

use super::{ApiError, CommerceError};

/// A JSON:API document with a single primary resource.
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    /// The primary resource.
    pub data: Resource,
    /// Related resources requested via `?include=`.
    #[serde(default)]
    pub included: Vec<Resource>,
}

/// A JSON:API document with a list of primary resources.
#[derive(Debug, Clone, Deserialize)]
pub struct ListDocument {
    /// The primary resources.
    pub data: Vec<Resource>,
    /// Related resources requested via `?include=`.
    #[serde(default)]
    pub included: Vec<Resource>,
}

/// A JSON:API error document.
#[derive(Debug, Deserialize)]
pub struct ErrorDocument {
    /// The error objects.
    #[serde(default)]
    pub errors: Vec<ApiError>,
}

/// A single JSON:API resource object.
#[derive(Debug, Clone, Deserialize)]
pub struct Resource {
    /// Resource identifier.
    pub id: String,
    /// Resource type, e.g. `orders` or `shipping_methods`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Attribute object; shape depends on `kind`.
    #[serde(default)]
    pub attributes: serde_json::Value,
    /// Named relationships with their linkage.
    #[serde(default)]
    pub relationships: HashMap<String, Relationship>,
}

impl Resource {
    /// Deserialize this resource's attributes into a typed struct.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::MalformedResource`] if the attribute object
    /// does not match the expected shape.
    pub fn parse_attributes<T: serde::de::DeserializeOwned>(&self) -> Result<T, CommerceError> {
        serde_json::from_value(self.attributes.clone()).map_err(|e| {
            CommerceError::MalformedResource {
                kind: self.kind.clone(),
                detail: e.to_string(),
            }
        })
    }
}

/// A relationship entry on a resource.
///
/// `data` is absent when linkage was not requested, `null` when the
/// relationship is empty, and one-or-many identifiers otherwise.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Relationship {
    /// Resource linkage, if present.
    #[serde(default)]
    pub data: Option<Linkage>,
}

/// Resource linkage: a single identifier or a list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Linkage {
    /// To-one relationship.
    One(ResourceIdentifier),
    /// To-many relationship.
    Many(Vec<ResourceIdentifier>),
}

/// A `{type, id}` pair pointing at a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct ResourceIdentifier {
    /// Resource identifier.
    pub id: String,
    /// Resource type.
    #[serde(rename = "type")]
    pub kind: String,
}

/// Lookup table over a compound document's `included` resources.
pub struct ResourceIndex<'a> {
    by_key: HashMap<(&'a str, &'a str), &'a Resource>,
}

impl<'a> ResourceIndex<'a> {
    /// Build an index over a set of included resources.
    #[must_use]
    pub fn new(included: &'a [Resource]) -> Self {
        let by_key = included
            .iter()
            .map(|r| ((r.kind.as_str(), r.id.as_str()), r))
            .collect();
        Self { by_key }
    }

    /// Look up a resource by type and id.
    #[must_use]
    pub fn get(&self, kind: &str, id: &str) -> Option<&'a Resource> {
        self.by_key.get(&(kind, id)).copied()
    }

    /// Resolve a to-one relationship on `resource` to its included resource.
    ///
    /// Returns `None` when the relationship is absent, empty, or the linked
    /// resource was not included in the document.
    #[must_use]
    pub fn one(&self, resource: &Resource, name: &str) -> Option<&'a Resource> {
        match resource.relationships.get(name)?.data.as_ref()? {
            Linkage::One(identifier) => self.get(&identifier.kind, &identifier.id),
            Linkage::Many(_) => None,
        }
    }

    /// Resolve a to-many relationship on `resource` to its included
    /// resources, skipping identifiers that were not included.
    #[must_use]
    pub fn many(&self, resource: &Resource, name: &str) -> Vec<&'a Resource> {
        let Some(relationship) = resource.relationships.get(name) else {
            return Vec::new();
        };
        match relationship.data.as_ref() {
            Some(Linkage::Many(identifiers)) => identifiers
                .iter()
                .filter_map(|identifier| self.get(&identifier.kind, &identifier.id))
                .collect(),
            Some(Linkage::One(identifier)) => self
                .get(&identifier.kind, &identifier.id)
                .into_iter()
                .collect(),
            None => Vec::new(),
        }
    }
}
