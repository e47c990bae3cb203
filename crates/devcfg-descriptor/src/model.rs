use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::errors::{DescriptorError, Result};

pub const WILDCARD_LOCALE: &str = "*";

/// Localized text with a mandatory `*` wildcard fallback.
///
/// Lookup is two-tier: the exact locale first, then the wildcard. The path of
/// the descriptor node owning the mapping is kept for error reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct LocaleMap {
    path: String,
    entries: BTreeMap<String, String>,
}

impl LocaleMap {
    pub fn new(path: impl Into<String>, entries: BTreeMap<String, String>) -> Result<Self> {
        let path = path.into();
        if !entries.contains_key(WILDCARD_LOCALE) {
            return Err(DescriptorError::MissingWildcardLabel { path });
        }
        Ok(Self { path, entries })
    }

    /// Builds a mapping from the wildcard entry alone.
    pub fn from_wildcard(path: impl Into<String>, text: impl Into<String>) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(WILDCARD_LOCALE.to_string(), text.into());
        Self {
            path: path.into(),
            entries,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(locale, text)| (locale.as_str(), text.as_str()))
    }

    /// Returns the text for `locale`, falling back to the wildcard entry.
    pub fn resolve(&self, locale: &str) -> Result<&str> {
        if let Some(text) = self.entries.get(locale) {
            return Ok(text);
        }
        self.entries
            .get(WILDCARD_LOCALE)
            .map(String::as_str)
            .ok_or_else(|| DescriptorError::MissingWildcardLabel {
                path: self.path.clone(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Period,
    Float,
    Int,
    Bool,
    Text,
    Extension(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Period => "period",
            FieldType::Float => "float",
            FieldType::Int => "int",
            FieldType::Bool => "bool",
            FieldType::Text => "string",
            FieldType::Extension(tag) => tag,
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "period" => FieldType::Period,
            "float" => FieldType::Float,
            "int" => FieldType::Int,
            "bool" => FieldType::Bool,
            "string" => FieldType::Text,
            other => FieldType::Extension(other.to_string()),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Text(String),
    Float(f64),
    Int(i64),
    Bool(bool),
}

impl DefaultValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DefaultValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DefaultValue::Float(value) => Some(*value),
            DefaultValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            DefaultValue::Text(text) => Value::from(text.as_str()),
            DefaultValue::Float(value) => Value::from(*value),
            DefaultValue::Int(value) => Value::from(*value),
            DefaultValue::Bool(value) => Value::from(*value),
        }
    }
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Text(text) => f.write_str(text),
            DefaultValue::Float(value) => write!(f, "{value}"),
            DefaultValue::Int(value) => write!(f, "{value}"),
            DefaultValue::Bool(value) => write!(f, "{value}"),
        }
    }
}

/// Classification of a measurable output channel. Both halves are always
/// present together, so they live in one struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableInfo {
    pub var_type: String,
    pub units: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterField {
    pub field_type: FieldType,
    pub label: LocaleMap,
    pub default: DefaultValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParameterNode {
    Group(ParameterGroup),
    Field(ParameterField),
}

impl ParameterNode {
    pub fn as_group(&self) -> Option<&ParameterGroup> {
        match self {
            ParameterNode::Group(group) => Some(group),
            ParameterNode::Field(_) => None,
        }
    }

    pub fn as_field(&self) -> Option<&ParameterField> {
        match self {
            ParameterNode::Field(field) => Some(field),
            ParameterNode::Group(_) => None,
        }
    }
}

/// A named node of the parameter tree. Children iterate in `child_order`,
/// which is validated on construction to be a permutation of the child key
/// set.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGroup {
    pub description: Option<LocaleMap>,
    pub variable: Option<VariableInfo>,
    child_order: Vec<String>,
    children: HashMap<String, ParameterNode>,
}

impl ParameterGroup {
    pub fn new(
        path: &str,
        child_order: Vec<String>,
        children: HashMap<String, ParameterNode>,
        description: Option<LocaleMap>,
        variable: Option<VariableInfo>,
    ) -> Result<Self> {
        for (index, name) in child_order.iter().enumerate() {
            if child_order[..index].contains(name) {
                return Err(DescriptorError::InconsistentOrdering {
                    group: path.to_string(),
                    detail: format!("'{name}' appears more than once in the declared order"),
                });
            }
        }

        let undeclared: Vec<&str> = children
            .keys()
            .filter(|name| !child_order.contains(*name))
            .map(String::as_str)
            .collect();
        if !undeclared.is_empty() {
            let mut undeclared = undeclared;
            undeclared.sort_unstable();
            return Err(DescriptorError::InconsistentOrdering {
                group: path.to_string(),
                detail: format!("children {undeclared:?} are missing from the declared order"),
            });
        }

        let undefined: Vec<&str> = child_order
            .iter()
            .filter(|name| !children.contains_key(*name))
            .map(String::as_str)
            .collect();
        if !undefined.is_empty() {
            return Err(DescriptorError::InconsistentOrdering {
                group: path.to_string(),
                detail: format!("declared order names {undefined:?} which have no definition"),
            });
        }

        Ok(Self {
            description,
            variable,
            child_order,
            children,
        })
    }

    pub fn child_order(&self) -> &[String] {
        &self.child_order
    }

    pub fn child(&self, name: &str) -> Option<&ParameterNode> {
        self.children.get(name)
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &ParameterNode)> {
        self.child_order.iter().map(|name| {
            let node = self
                .children
                .get(name)
                .expect("child order validated against children");
            (name.as_str(), node)
        })
    }

    pub fn len(&self) -> usize {
        self.child_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.child_order.is_empty()
    }
}

/// The product metadata descriptor: immutable once loaded, consumed by the
/// host framework's configuration editor.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDescriptor {
    pub product_name: String,
    pub description: LocaleMap,
    pub supports: Vec<String>,
    pub parameters: ParameterGroup,
}

impl ProductDescriptor {
    /// Looks up a node by dot-joined path relative to the parameter root,
    /// e.g. `outputs.Irr.delta_min`.
    pub fn node(&self, path: &str) -> Option<&ParameterNode> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.parameters.child(first)?;
        for segment in segments {
            current = current.as_group()?.child(segment)?;
        }
        Some(current)
    }

    pub fn field(&self, path: &str) -> Option<&ParameterField> {
        self.node(path)?.as_field()
    }

    pub fn group(&self, path: &str) -> Option<&ParameterGroup> {
        self.node(path)?.as_group()
    }

    /// Flattens the tree into a path-to-default mapping, used to pre-populate
    /// the configuration of a freshly registered device.
    pub fn default_values(&self) -> BTreeMap<String, DefaultValue> {
        let mut defaults = BTreeMap::new();
        collect_defaults(&self.parameters, "", &mut defaults);
        defaults
    }
}

fn collect_defaults(
    group: &ParameterGroup,
    prefix: &str,
    defaults: &mut BTreeMap<String, DefaultValue>,
) {
    for (name, node) in group.children() {
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };
        match node {
            ParameterNode::Group(child) => collect_defaults(child, &path, defaults),
            ParameterNode::Field(field) => {
                defaults.insert(path, field.default.clone());
            }
        }
    }
}
