pub mod index;
pub mod linearize;

pub use index::{DefinitionIndex, FieldDefinition, MessageDefinition};
pub use linearize::linearize;
