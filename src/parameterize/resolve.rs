use serde_json::Value as JsonValue;

use crate::types::RowValues;

/// Resolve a dotted parameter name against a JSON parameter bag.
///
/// Each `.`-separated segment is a key lookup on an object, or an index into an array.
/// Any segment that does not resolve yields [`RowValues::Missing`].
#[must_use]
pub fn resolve(name: &str, params: &JsonValue) -> RowValues {
    lookup(name, params).map_or(RowValues::Missing, RowValues::from)
}

/// Walk a dotted path through `params`, returning the JSON value it addresses.
#[must_use]
pub fn lookup<'a>(name: &str, params: &'a JsonValue) -> Option<&'a JsonValue> {
    name.split('.')
        .try_fold(params, |current, segment| match current {
            JsonValue::Object(map) => map.get(segment),
            JsonValue::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}
