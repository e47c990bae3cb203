use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::{DescriptorError, Result};
use crate::fieldtypes::{FieldTypeRegistry, ValueShape, BUILTIN_REGISTRY};
use crate::model::{
    DefaultValue, FieldType, LocaleMap, ParameterField, ParameterGroup, ParameterNode,
    ProductDescriptor, VariableInfo,
};
use crate::period::parse_period;

// Wire keys shared with the host framework's configuration editor. These are
// part of the contract and must not change.
pub const KEY_PRODUCT_NAME: &str = "productname";
pub const KEY_DESCRIPTION: &str = "__descr__";
pub const KEY_SUPPORTS: &str = "supports";
pub const KEY_PDEFS: &str = "pdefs";
pub const KEY_SEQ: &str = "__seq__";
pub const KEY_TYPE: &str = "type";
pub const KEY_LABEL: &str = "label";
pub const KEY_DEFAULT: &str = "defvalue";
pub const KEY_VAR_TYPE: &str = "__vartype__";
pub const KEY_VAR_UNITS: &str = "__varunits__";

const GROUP_RESERVED_KEYS: [&str; 4] = [KEY_SEQ, KEY_DESCRIPTION, KEY_VAR_TYPE, KEY_VAR_UNITS];
const FIELD_KEYS: [&str; 3] = [KEY_TYPE, KEY_LABEL, KEY_DEFAULT];

/// Parses a descriptor document, validating field types against the built-in
/// registry.
pub fn load_descriptor(content: &str) -> Result<ProductDescriptor> {
    load_descriptor_with(content, &BUILTIN_REGISTRY)
}

/// Parses a descriptor document against a caller-supplied field-type
/// registry, for host frameworks that register extension types.
pub fn load_descriptor_with(
    content: &str,
    registry: &FieldTypeRegistry,
) -> Result<ProductDescriptor> {
    let value: Value = serde_json::from_str(content)?;
    from_value(&value, registry)
}

pub fn load_descriptor_file(path: impl AsRef<Path>) -> Result<ProductDescriptor> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading descriptor document");
    let content = fs::read_to_string(path)?;
    load_descriptor(&content)
}

pub fn from_value(value: &Value, registry: &FieldTypeRegistry) -> Result<ProductDescriptor> {
    let object = value
        .as_object()
        .ok_or_else(|| DescriptorError::malformed("top-level document must be a JSON object"))?;

    let product_name = require_string(object, KEY_PRODUCT_NAME, "descriptor")?;
    if product_name.is_empty() {
        return Err(DescriptorError::malformed(format!(
            "'{KEY_PRODUCT_NAME}' must not be empty"
        )));
    }

    let description_value = require_key(object, KEY_DESCRIPTION, "descriptor")?;
    let description = parse_locale_map(&product_name, description_value)?;

    let supports = match object.get(KEY_SUPPORTS) {
        None => Vec::new(),
        Some(value) => parse_supports(value)?,
    };

    let pdefs_value = require_key(object, KEY_PDEFS, "descriptor")?;
    let parameters = parse_group(KEY_PDEFS, "", pdefs_value, registry)?;

    let descriptor = ProductDescriptor {
        product_name,
        description,
        supports,
        parameters,
    };
    debug!(
        product = %descriptor.product_name,
        fields = descriptor.default_values().len(),
        "loaded product descriptor"
    );
    Ok(descriptor)
}

/// Re-serializes a descriptor to its wire shape. `load` of the result yields
/// an equal model.
pub fn to_value(descriptor: &ProductDescriptor) -> Value {
    let mut object = Map::new();
    object.insert(
        KEY_PRODUCT_NAME.to_string(),
        Value::from(descriptor.product_name.as_str()),
    );
    object.insert(
        KEY_DESCRIPTION.to_string(),
        locale_map_to_value(&descriptor.description),
    );
    object.insert(
        KEY_SUPPORTS.to_string(),
        Value::from(descriptor.supports.clone()),
    );
    object.insert(KEY_PDEFS.to_string(), group_to_value(&descriptor.parameters));
    Value::Object(object)
}

pub fn to_json_string(descriptor: &ProductDescriptor) -> Result<String> {
    serde_json::to_string_pretty(&to_value(descriptor)).map_err(DescriptorError::from)
}

fn parse_supports(value: &Value) -> Result<Vec<String>> {
    let entries = value
        .as_array()
        .ok_or_else(|| DescriptorError::malformed(format!("'{KEY_SUPPORTS}' must be an array")))?;
    entries
        .iter()
        .map(|entry| {
            entry
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| {
                    DescriptorError::malformed(format!(
                        "'{KEY_SUPPORTS}' entries must be strings, found {entry}"
                    ))
                })
        })
        .collect()
}

fn parse_group(
    label: &str,
    prefix: &str,
    value: &Value,
    registry: &FieldTypeRegistry,
) -> Result<ParameterGroup> {
    let object = value
        .as_object()
        .ok_or_else(|| DescriptorError::malformed(format!("group '{label}' must be an object")))?;

    let seq_value = object.get(KEY_SEQ).ok_or_else(|| {
        DescriptorError::malformed(format!("group '{label}' is missing '{KEY_SEQ}'"))
    })?;
    let child_order = parse_child_order(label, seq_value)?;

    let description = match object.get(KEY_DESCRIPTION) {
        None => None,
        Some(value) => Some(parse_locale_map(label, value)?),
    };

    let variable = parse_variable(label, object)?;

    let mut children = HashMap::new();
    for (name, child_value) in object {
        if GROUP_RESERVED_KEYS.contains(&name.as_str()) {
            continue;
        }
        let child_path = join_path(prefix, name);
        let child_object = child_value.as_object().ok_or_else(|| {
            DescriptorError::malformed(format!("entry '{child_path}' must be an object"))
        })?;
        let node = if child_object.contains_key(KEY_TYPE) {
            ParameterNode::Field(parse_field(&child_path, child_object, registry)?)
        } else {
            ParameterNode::Group(parse_group(&child_path, &child_path, child_value, registry)?)
        };
        children.insert(name.clone(), node);
    }

    ParameterGroup::new(label, child_order, children, description, variable)
}

fn parse_child_order(label: &str, value: &Value) -> Result<Vec<String>> {
    let entries = value.as_array().ok_or_else(|| {
        DescriptorError::malformed(format!("'{KEY_SEQ}' of group '{label}' must be an array"))
    })?;
    entries
        .iter()
        .map(|entry| {
            entry.as_str().map(str::to_string).ok_or_else(|| {
                DescriptorError::malformed(format!(
                    "'{KEY_SEQ}' of group '{label}' must contain strings, found {entry}"
                ))
            })
        })
        .collect()
}

fn parse_variable(label: &str, object: &Map<String, Value>) -> Result<Option<VariableInfo>> {
    let var_type = optional_string(object, KEY_VAR_TYPE, label)?;
    let units = optional_string(object, KEY_VAR_UNITS, label)?;
    match (var_type, units) {
        (Some(var_type), Some(units)) => Ok(Some(VariableInfo { var_type, units })),
        (None, None) => Ok(None),
        (Some(_), None) => Err(DescriptorError::malformed(format!(
            "group '{label}' has '{KEY_VAR_TYPE}' without '{KEY_VAR_UNITS}'"
        ))),
        (None, Some(_)) => Err(DescriptorError::malformed(format!(
            "group '{label}' has '{KEY_VAR_UNITS}' without '{KEY_VAR_TYPE}'"
        ))),
    }
}

fn parse_field(
    path: &str,
    object: &Map<String, Value>,
    registry: &FieldTypeRegistry,
) -> Result<ParameterField> {
    for key in object.keys() {
        if !FIELD_KEYS.contains(&key.as_str()) {
            return Err(DescriptorError::malformed(format!(
                "field '{path}' has unsupported key '{key}'"
            )));
        }
    }

    let tag = require_string(object, KEY_TYPE, path)?;
    let shape = registry
        .shape(&tag)
        .ok_or_else(|| DescriptorError::UnknownFieldType {
            path: path.to_string(),
            tag: tag.clone(),
        })?;

    let label_value = require_key(object, KEY_LABEL, path)?;
    let label = parse_locale_map(path, label_value)?;

    let default_value = require_key(object, KEY_DEFAULT, path)?;
    let default = coerce_default(path, &tag, shape, default_value)?;

    Ok(ParameterField {
        field_type: FieldType::from_tag(&tag),
        label,
        default,
    })
}

fn coerce_default(path: &str, tag: &str, shape: ValueShape, value: &Value) -> Result<DefaultValue> {
    let mismatch = |detail: String| DescriptorError::InvalidDefault {
        path: path.to_string(),
        tag: tag.to_string(),
        detail,
    };

    match shape {
        ValueShape::Period => {
            let text = value
                .as_str()
                .ok_or_else(|| mismatch(format!("expected a period string, found {value}")))?;
            parse_period(text).map_err(|err| mismatch(err.to_string()))?;
            Ok(DefaultValue::Text(text.to_string()))
        }
        ValueShape::Number => value
            .as_f64()
            .map(DefaultValue::Float)
            .ok_or_else(|| mismatch(format!("expected a number, found {value}"))),
        ValueShape::Integer => value
            .as_i64()
            .map(DefaultValue::Int)
            .ok_or_else(|| mismatch(format!("expected an integer, found {value}"))),
        ValueShape::Boolean => value
            .as_bool()
            .map(DefaultValue::Bool)
            .ok_or_else(|| mismatch(format!("expected a boolean, found {value}"))),
        ValueShape::Text => value
            .as_str()
            .map(|text| DefaultValue::Text(text.to_string()))
            .ok_or_else(|| mismatch(format!("expected a string, found {value}"))),
    }
}

fn parse_locale_map(path: &str, value: &Value) -> Result<LocaleMap> {
    let object = value.as_object().ok_or_else(|| {
        DescriptorError::malformed(format!("locale mapping of '{path}' must be an object"))
    })?;

    let mut entries = BTreeMap::new();
    for (locale, text) in object {
        let text = text.as_str().ok_or_else(|| {
            DescriptorError::malformed(format!(
                "locale mapping of '{path}' must map '{locale}' to a string"
            ))
        })?;
        entries.insert(locale.clone(), text.to_string());
    }
    LocaleMap::new(path, entries)
}

fn group_to_value(group: &ParameterGroup) -> Value {
    let mut object = Map::new();
    object.insert(KEY_SEQ.to_string(), Value::from(group.child_order().to_vec()));
    if let Some(description) = &group.description {
        object.insert(KEY_DESCRIPTION.to_string(), locale_map_to_value(description));
    }
    if let Some(variable) = &group.variable {
        object.insert(
            KEY_VAR_TYPE.to_string(),
            Value::from(variable.var_type.as_str()),
        );
        object.insert(
            KEY_VAR_UNITS.to_string(),
            Value::from(variable.units.as_str()),
        );
    }
    for (name, node) in group.children() {
        let value = match node {
            ParameterNode::Group(child) => group_to_value(child),
            ParameterNode::Field(field) => field_to_value(field),
        };
        object.insert(name.to_string(), value);
    }
    Value::Object(object)
}

fn field_to_value(field: &ParameterField) -> Value {
    let mut object = Map::new();
    object.insert(
        KEY_TYPE.to_string(),
        Value::from(field.field_type.as_str()),
    );
    object.insert(KEY_LABEL.to_string(), locale_map_to_value(&field.label));
    object.insert(KEY_DEFAULT.to_string(), field.default.to_json());
    Value::Object(object)
}

fn locale_map_to_value(map: &LocaleMap) -> Value {
    let mut object = Map::new();
    for (locale, text) in map.entries() {
        object.insert(locale.to_string(), Value::from(text));
    }
    Value::Object(object)
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn require_key<'a>(object: &'a Map<String, Value>, key: &str, owner: &str) -> Result<&'a Value> {
    object.get(key).ok_or_else(|| {
        DescriptorError::malformed(format!("{owner} is missing required key '{key}'"))
    })
}

fn require_string(object: &Map<String, Value>, key: &str, owner: &str) -> Result<String> {
    let value = require_key(object, key, owner)?;
    value.as_str().map(str::to_string).ok_or_else(|| {
        DescriptorError::malformed(format!("'{key}' of {owner} must be a string"))
    })
}

fn optional_string(
    object: &Map<String, Value>,
    key: &str,
    owner: &str,
) -> Result<Option<String>> {
    match object.get(key) {
        None => Ok(None),
        Some(value) => value.as_str().map(|s| Some(s.to_string())).ok_or_else(|| {
            DescriptorError::malformed(format!("'{key}' of group '{owner}' must be a string"))
        }),
    }
}
