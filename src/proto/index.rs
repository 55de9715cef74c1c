//! Definition Index: message name → structural definition for one `.proto` file.

use std::path::Path;

use indexmap::IndexMap;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto};
use tracing::debug;

use crate::error::AppError;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// A field as seen by the linearizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub name: String,
    pub type_name: String,
    pub sequence: u32,
    pub repeated: bool,
    /// Value type of a `map<K, V>` field.
    pub value_type: Option<String>,
}

impl FieldDefinition {
    /// The type name that may point at another indexed message.
    pub fn referenced_type(&self) -> &str {
        self.value_type.as_deref().unwrap_or(&self.type_name)
    }

    /// `parent` is needed to resolve the synthetic entry type behind a map field.
    fn from_descriptor(field: &FieldDescriptorProto, parent: &DescriptorProto) -> Self {
        let name = field.name().to_string();
        let sequence = u32::try_from(field.number()).unwrap_or_default();

        if let Some(entry) = map_entry_of(field, parent) {
            let key = entry_field_type(entry, 1);
            let value = entry_field_type(entry, 2);
            return Self {
                name,
                type_name: format!("map<{key}, {value}>"),
                sequence,
                repeated: false,
                value_type: Some(value),
            };
        }

        Self {
            name,
            type_name: type_text(field),
            sequence,
            repeated: field.label() == Label::Repeated,
            value_type: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDefinition {
    pub name: String,
    pub fields: Vec<FieldDefinition>,
}

impl From<&DescriptorProto> for MessageDefinition {
    /// Oneof members already sit in `field` in declaration order, so they
    /// come out flattened into the message.
    fn from(message: &DescriptorProto) -> Self {
        Self {
            name: message.name().to_string(),
            fields: message
                .field
                .iter()
                .map(|f| FieldDefinition::from_descriptor(f, message))
                .collect(),
        }
    }
}

/// Flat, read-only map of every message in a file, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct DefinitionIndex {
    messages: IndexMap<String, MessageDefinition>,
}

impl DefinitionIndex {
    /// Parse the file at `path` and index every message at any nesting depth.
    pub fn build(path: &Path) -> Result<Self, AppError> {
        let label = path.display().to_string();
        let source = std::fs::read_to_string(path).map_err(|e| AppError::Parse {
            path: label.clone(),
            message: e.to_string(),
        })?;
        Self::from_source(&source, &label)
    }

    /// Index an in-memory `.proto` source. `label` names it in error messages.
    pub fn from_source(source: &str, label: &str) -> Result<Self, AppError> {
        let source = source.strip_prefix(BYTE_ORDER_MARK).unwrap_or(source);
        let file = protox_parse::parse(label, source).map_err(|e| AppError::Parse {
            path: label.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::from_descriptor(&file))
    }

    pub fn from_descriptor(file: &FileDescriptorProto) -> Self {
        let mut messages = IndexMap::new();
        for message in &file.message_type {
            insert_message(&mut messages, message);
        }
        Self { messages }
    }

    pub fn get(&self, name: &str) -> Option<&MessageDefinition> {
        self.messages.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.messages.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &MessageDefinition> {
        self.messages.values()
    }
}

/// Outer message first, then its nested messages. Map entry types are skipped.
fn insert_message(messages: &mut IndexMap<String, MessageDefinition>, message: &DescriptorProto) {
    if is_map_entry(message) {
        return;
    }

    let definition = MessageDefinition::from(message);
    // Last declaration wins and takes the later position.
    if messages.shift_remove(&definition.name).is_some() {
        debug!(name = %definition.name, "duplicate message name, keeping later declaration");
    }
    messages.insert(definition.name.clone(), definition);

    for nested in &message.nested_type {
        insert_message(messages, nested);
    }
}

fn is_map_entry(message: &DescriptorProto) -> bool {
    message.options.as_ref().is_some_and(|o| o.map_entry())
}

fn map_entry_of<'a>(field: &FieldDescriptorProto, parent: &'a DescriptorProto) -> Option<&'a DescriptorProto> {
    if field.label() != Label::Repeated || field.type_name().is_empty() {
        return None;
    }
    let simple = field.type_name().rsplit('.').next()?;
    parent
        .nested_type
        .iter()
        .find(|n| n.name() == simple && is_map_entry(n))
}

fn entry_field_type(entry: &DescriptorProto, number: i32) -> String {
    entry
        .field
        .iter()
        .find(|f| f.number() == number)
        .map(type_text)
        .unwrap_or_default()
}

/// Type as written in the source: the referenced name, or the scalar keyword.
fn type_text(field: &FieldDescriptorProto) -> String {
    if !field.type_name().is_empty() {
        return field.type_name().to_string();
    }
    let keyword = match field.r#type() {
        Type::Double => "double",
        Type::Float => "float",
        Type::Int64 => "int64",
        Type::Uint64 => "uint64",
        Type::Int32 => "int32",
        Type::Fixed64 => "fixed64",
        Type::Fixed32 => "fixed32",
        Type::Bool => "bool",
        Type::String => "string",
        Type::Bytes => "bytes",
        Type::Uint32 => "uint32",
        Type::Sfixed32 => "sfixed32",
        Type::Sfixed64 => "sfixed64",
        Type::Sint32 => "sint32",
        Type::Sint64 => "sint64",
        Type::Group => "group",
        Type::Message => "message",
        Type::Enum => "enum",
    };
    keyword.to_string()
}
