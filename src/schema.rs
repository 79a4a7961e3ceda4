//! JSON schema generation for structured LLM outputs.
//!
//! The chat completions API validates responses against a schema in strict
//! mode, which is pickier than what `schemars` emits by default. Strict mode
//! requires:
//!
//! 1. `additionalProperties: false` on every object
//! 2. every property listed in `required`, nullable ones included
//! 3. no `$ref` indirection
//!
//! [`strict`] derives the schema from the type and rewrites it to satisfy
//! all three. Array length rules (minimum key points and the like) are not
//! expressible in strict mode, so those are enforced by prompt wording and
//! post-processing instead.

use schemars::{JsonSchema, schema_for};
use serde_json::Value;

/// Build a strict-mode-compatible JSON schema for `T`.
pub fn strict<T: JsonSchema>() -> Value {
    let root = schema_for!(T);
    let mut schema = serde_json::to_value(root).unwrap_or_default();

    // Definitions are fixed first so the inlined copies are already strict.
    enforce_strict_objects(&mut schema);
    inline_definitions(&mut schema);

    if let Value::Object(map) = &mut schema {
        map.remove("definitions");
        map.remove("$schema");
    }
    schema
}

/// Add `additionalProperties: false` to every object schema and mirror its
/// property list into `required`.
fn enforce_strict_objects(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if map.get("type") == Some(&Value::String("object".to_string())) {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
                if let Some(Value::Object(props)) = map.get("properties") {
                    let all_keys: Vec<Value> =
                        props.keys().map(|k| Value::String(k.clone())).collect();
                    map.insert("required".to_string(), Value::Array(all_keys));
                }
            }
            for (_, v) in map.iter_mut() {
                enforce_strict_objects(v);
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                enforce_strict_objects(item);
            }
        }
        _ => {}
    }
}

/// Replace every `#/definitions/...` reference with a copy of the definition.
fn inline_definitions(value: &mut Value) {
    let definitions = match value {
        Value::Object(map) => map.get("definitions").cloned(),
        _ => None,
    };
    if let Some(defs) = definitions {
        inline_refs(value, &defs);
    }
}

fn inline_refs(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(ref_path)) = map.get("$ref").cloned() {
                if let Some(name) = ref_path.strip_prefix("#/definitions/") {
                    if let Some(def) = definitions.get(name) {
                        *value = def.clone();
                        // The inlined copy may itself hold refs.
                        inline_refs(value, definitions);
                        return;
                    }
                }
            }
            for (_, v) in map.iter_mut() {
                inline_refs(v, definitions);
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                inline_refs(item, definitions);
            }
        }
        _ => {}
    }
}
