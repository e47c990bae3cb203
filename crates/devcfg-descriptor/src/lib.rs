pub mod catalog;
pub mod errors;
pub mod fieldtypes;
pub mod model;
pub mod period;
pub mod wire;

pub use errors::DescriptorError;
pub use fieldtypes::{FieldTypeRegistry, ValueShape};
pub use model::{
    DefaultValue, FieldType, LocaleMap, ParameterField, ParameterGroup, ParameterNode,
    ProductDescriptor, VariableInfo,
};
pub use wire::{
    load_descriptor, load_descriptor_file, load_descriptor_with, to_json_string, to_value,
};

#[cfg(test)]
mod tests;
