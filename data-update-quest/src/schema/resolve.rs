//! Recursive `$ref`/`allOf` resolution.

use std::collections::HashSet;

use serde_json::{Map, Value};

use super::compose::compose;
use crate::errors::{MigrationError, Result};

/// Keys carrying documentation only. They never affect document shape.
pub const DESCRIPTIVE_KEYS: &[&str] = &[
    "description",
    "title",
    "summary",
    "$comment",
    "example",
    "examples",
    "externalDocs",
];

/// Keys whose object value maps field/schema names to schema nodes.
const NAME_KEYED: &[&str] = &["properties", "patternProperties", "definitions", "$defs"];

/// Keys whose value is document data rather than schema.
const DATA_KEYS: &[&str] = &["default", "enum", "const"];

const COMPONENTS_PREFIX: &str = "#/components/schemas/";
const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Inlines references against a single document root.
pub struct Resolver<'a> {
    root: &'a Value,
}

impl<'a> Resolver<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self { root }
    }

    /// Resolve a schema node taken from this resolver's document.
    pub fn resolve(&self, schema: &Value) -> Result<Value> {
        let mut in_progress = HashSet::new();
        self.resolve_node(schema, &mut in_progress)
    }

    fn resolve_node(&self, node: &Value, in_progress: &mut HashSet<String>) -> Result<Value> {
        match node {
            Value::Object(map) => self.resolve_object(map, in_progress),
            Value::Array(items) => items
                .iter()
                .map(|item| self.resolve_node(item, in_progress))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }

    fn resolve_object(&self, map: &Map<String, Value>, in_progress: &mut HashSet<String>) -> Result<Value> {
        let mut resolved = self.resolve_siblings(map, in_progress)?;

        if let Some(members) = map.get("allOf") {
            let members = self.resolve_members(members, in_progress)?;
            resolved = compose(members, resolved);
        }

        match map.get("$ref") {
            Some(reference) => self.splice_reference(reference, resolved, in_progress),
            None => Ok(Value::Object(resolved)),
        }
    }

    /// Every key except the markers, stripped of descriptive text and resolved.
    fn resolve_siblings(
        &self,
        map: &Map<String, Value>,
        in_progress: &mut HashSet<String>,
    ) -> Result<Map<String, Value>> {
        let mut siblings = Map::new();

        for (key, value) in map {
            let key = key.as_str();
            if key == "$ref" || key == "allOf" || DESCRIPTIVE_KEYS.contains(&key) {
                continue;
            }

            let resolved = if DATA_KEYS.contains(&key) {
                value.clone()
            } else if NAME_KEYED.contains(&key)
                && let Value::Object(named) = value
            {
                let mut out = Map::new();
                for (name, schema) in named {
                    out.insert(name.clone(), self.resolve_node(schema, in_progress)?);
                }
                Value::Object(out)
            } else {
                self.resolve_node(value, in_progress)?
            };

            siblings.insert(key.to_string(), resolved);
        }

        Ok(siblings)
    }

    fn resolve_members(&self, members: &Value, in_progress: &mut HashSet<String>) -> Result<Vec<Value>> {
        match members {
            Value::Array(items) => items
                .iter()
                .map(|member| self.resolve_node(member, in_progress))
                .collect(),
            single => Ok(vec![self.resolve_node(single, in_progress)?]),
        }
    }

    fn splice_reference(
        &self,
        reference: &Value,
        siblings: Map<String, Value>,
        in_progress: &mut HashSet<String>,
    ) -> Result<Value> {
        let Some(address) = reference.as_str() else {
            return Err(MigrationError::UnsupportedReferenceFormat {
                reference: reference.to_string(),
            });
        };

        if in_progress.contains(address) {
            log::debug!("reference cycle on {address}, keeping placeholder");
            return Ok(Value::Object(siblings));
        }

        let target = self.lookup(address)?;

        in_progress.insert(address.to_string());
        let resolved = self.resolve_node(target, in_progress);
        in_progress.remove(address);

        match resolved? {
            Value::Object(mut merged) => {
                for (key, value) in siblings {
                    merged.insert(key, value);
                }
                Ok(Value::Object(merged))
            }
            other if siblings.is_empty() => Ok(other),
            _ => Ok(Value::Object(siblings)),
        }
    }

    fn lookup(&self, address: &str) -> Result<&'a Value> {
        let (section, name) = parse_reference(address)?;
        let container = match section {
            Section::Components => self
                .root
                .get("components")
                .and_then(|components| components.get("schemas")),
            Section::Definitions => self.root.get("definitions"),
        };

        container
            .and_then(|schemas| schemas.get(&name))
            .ok_or_else(|| MigrationError::DanglingReference {
                reference: address.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Components,
    Definitions,
}

fn parse_reference(address: &str) -> Result<(Section, String)> {
    let (section, rest) = if let Some(rest) = address.strip_prefix(COMPONENTS_PREFIX) {
        (Section::Components, rest)
    } else if let Some(rest) = address.strip_prefix(DEFINITIONS_PREFIX) {
        (Section::Definitions, rest)
    } else {
        return Err(MigrationError::UnsupportedReferenceFormat {
            reference: address.to_string(),
        });
    };

    if rest.is_empty() || rest.contains('/') {
        return Err(MigrationError::UnsupportedReferenceFormat {
            reference: address.to_string(),
        });
    }

    Ok((section, rest.replace("~1", "/").replace("~0", "~")))
}
