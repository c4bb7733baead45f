//! `allOf` merging.

use serde_json::{Map, Value};

/// Merge resolved `allOf` members, then the composing node's own keys, into one schema.
///
/// `properties` maps merge key by key with later members winning, list attributes
/// (`required`, `enum`, ...) are unioned in first-seen order, anything else is
/// overridden by later members.
pub(super) fn compose(members: Vec<Value>, own: Map<String, Value>) -> Map<String, Value> {
    let mut merged = Map::new();

    for member in members {
        match member {
            Value::Object(map) => merge_into(&mut merged, map),
            other => log::debug!("ignoring non-object allOf member: {other}"),
        }
    }

    merge_into(&mut merged, own);
    merged
}

fn merge_into(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) if key == "properties" => {
                for (name, schema) in incoming {
                    existing.insert(name, schema);
                }
            }
            (Some(Value::Array(existing)), Value::Array(incoming)) => {
                for item in incoming {
                    if !existing.contains(&item) {
                        existing.push(item);
                    }
                }
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}
