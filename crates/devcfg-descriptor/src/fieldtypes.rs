use std::collections::BTreeMap;

use once_cell::sync::Lazy;

/// The shape a field's default value must take on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// A compact duration string such as `"1m"` or `"2h"`.
    Period,
    /// Any JSON number.
    Number,
    /// A JSON integer.
    Integer,
    /// A JSON boolean.
    Boolean,
    /// A JSON string.
    Text,
}

/// Registry of the leaf `type` tags the configuration editor understands.
///
/// The full set is owned by the host framework, so the registry is open:
/// callers register extension tags on top of the built-in set instead of the
/// library guessing a closed enumeration.
#[derive(Debug, Clone)]
pub struct FieldTypeRegistry {
    shapes: BTreeMap<String, ValueShape>,
}

impl FieldTypeRegistry {
    pub fn builtin() -> Self {
        let mut registry = Self {
            shapes: BTreeMap::new(),
        };
        registry.register("period", ValueShape::Period);
        registry.register("float", ValueShape::Number);
        registry.register("int", ValueShape::Integer);
        registry.register("bool", ValueShape::Boolean);
        registry.register("string", ValueShape::Text);
        registry
    }

    pub fn register(&mut self, tag: impl Into<String>, shape: ValueShape) {
        self.shapes.insert(tag.into(), shape);
    }

    pub fn recognizes(&self, tag: &str) -> bool {
        self.shapes.contains_key(tag)
    }

    pub fn shape(&self, tag: &str) -> Option<ValueShape> {
        self.shapes.get(tag).copied()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.shapes.keys().map(String::as_str)
    }
}

pub(crate) static BUILTIN_REGISTRY: Lazy<FieldTypeRegistry> = Lazy::new(FieldTypeRegistry::builtin);
