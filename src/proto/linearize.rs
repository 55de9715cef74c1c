//! Definition Linearizer: renders a message after everything it depends on.
//!
//! Output is a series of `message Name {...}` blocks separated by blank
//! lines. A referenced message is rendered (recursively) before the message
//! that references it, once per referencing field; there is no deduplication.

use super::index::{DefinitionIndex, FieldDefinition};
use crate::error::AppError;

/// Render `target` and, ahead of it, every indexed message it transitively references.
pub fn linearize(index: &DefinitionIndex, target: &str) -> Result<String, AppError> {
    let mut path = Vec::new();
    render(index, target, &mut path)
}

/// `path` holds the names currently being rendered, outermost first.
fn render(index: &DefinitionIndex, name: &str, path: &mut Vec<String>) -> Result<String, AppError> {
    if path.iter().any(|n| n == name) {
        let mut chain = path.clone();
        chain.push(name.to_string());
        return Err(AppError::CyclicDefinition {
            chain: chain.join(" -> "),
        });
    }

    let def = index.get(name).ok_or_else(|| AppError::UnknownDefinition {
        name: name.to_string(),
    })?;

    path.push(name.to_string());

    let mut blocks = Vec::new();
    let mut lines = Vec::with_capacity(def.fields.len());
    for field in &def.fields {
        let referenced = field.referenced_type();
        if index.contains(referenced) {
            blocks.push(render(index, referenced, path)?);
        }
        lines.push(field_line(field));
    }

    path.pop();

    blocks.push(format!("message {} {{\n{}\n}}", def.name, lines.join("\n")));
    Ok(blocks.join("\n\n"))
}

/// `Type name=N;`, and for repeated fields the same text again behind a
/// `repeated ` prefix on the same line.
fn field_line(field: &FieldDefinition) -> String {
    let base = format!("{} {}={};", field.type_name, field.name, field.sequence);
    if field.repeated {
        format!("{base}repeated {base}")
    } else {
        base
    }
}
