use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Types Claude can be asked to return through a tool's `input_schema`.
///
/// Implemented for every `JsonSchema + DeserializeOwned` type. The generated
/// schema is closed: objects get `additionalProperties: false`, every property
/// is listed in `required`, and `$ref`s are inlined so the tool definition is
/// self-contained.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    fn tool_schema() -> Value {
        let schema = schema_for!(Self);
        let mut value = serde_json::to_value(schema).unwrap_or_default();

        close_object_schemas(&mut value);
        inline_refs(&mut value);

        if let Value::Object(map) = &mut value {
            map.remove("definitions");
            map.remove("$schema");
            map.remove("title");
        }

        value
    }

    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

fn close_object_schemas(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if map.get("type").and_then(Value::as_str) == Some("object") {
                map.insert("additionalProperties".to_string(), Value::Bool(false));

                let required: Option<Vec<Value>> = map
                    .get("properties")
                    .and_then(Value::as_object)
                    .map(|props| props.keys().cloned().map(Value::String).collect());
                if let Some(required) = required {
                    map.insert("required".to_string(), Value::Array(required));
                }
            }

            for (_, v) in map.iter_mut() {
                close_object_schemas(v);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(close_object_schemas),
        _ => {}
    }
}

fn inline_refs(value: &mut Value) {
    let definitions = value.get("definitions").cloned();
    if let Some(defs) = definitions {
        inline_refs_recursive(value, &defs);
    }
}

fn inline_refs_recursive(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            let referenced = map
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(|r| r.strip_prefix("#/definitions/"))
                .and_then(|name| definitions.get(name))
                .cloned();
            if let Some(def) = referenced {
                *value = def;
                inline_refs_recursive(value, definitions);
                return;
            }

            let single_all_of = match map.get("allOf") {
                Some(Value::Array(all_of)) if all_of.len() == 1 => all_of.first().cloned(),
                _ => None,
            };
            if let Some(inner) = single_all_of {
                *value = inner;
                inline_refs_recursive(value, definitions);
                return;
            }

            for (_, v) in map.iter_mut() {
                inline_refs_recursive(v, definitions);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                inline_refs_recursive(item, definitions);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    struct GrammarAnswer {
        query: String,
        description: String,
    }

    #[test]
    fn schema_is_closed_object() {
        let schema = GrammarAnswer::tool_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["additionalProperties"], Value::Bool(false));
        assert!(schema.get("$schema").is_none());
    }

    #[test]
    fn every_property_is_required() {
        #[derive(Deserialize, JsonSchema)]
        struct Partial {
            name: String,
            breed: Option<String>,
        }

        let schema = Partial::tool_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .expect("should have required array")
            .iter()
            .filter_map(Value::as_str)
            .collect();

        assert!(required.contains(&"name"));
        assert!(required.contains(&"breed"));
    }

    #[test]
    fn nested_struct_is_inlined() {
        #[derive(Deserialize, JsonSchema)]
        struct Species {
            name: String,
        }

        #[derive(Deserialize, JsonSchema)]
        struct Patient {
            species: Species,
            code: String,
        }

        let schema = Patient::tool_schema();
        assert!(schema.get("definitions").is_none());

        let species = &schema["properties"]["species"];
        assert!(species.get("$ref").is_none());
        assert_eq!(species["type"], "object");
        assert_eq!(species["additionalProperties"], Value::Bool(false));
    }
}
