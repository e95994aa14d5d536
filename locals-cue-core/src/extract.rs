//! Locals extraction: HCL text in, [`LocalVars`] out.
//!
//! Only top-level `locals` blocks are inspected, and only three of their attributes are
//! kept. Each attribute is evaluated with an empty context; anything that needs a
//! variable or a function does not evaluate and is skipped.

use std::collections::{BTreeMap, HashSet};

use hcl::eval::{Context, Evaluate};
use hcl::{Attribute, Block, Value};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

pub const LOCALS_BLOCK: &str = "locals";
pub const TO_DISPLAY_NAME: &str = "to_display_name";
pub const TO_FIXED: &str = "to_fixed";
pub const TO_SHORT: &str = "to_short";

/// The three string maps read from the `locals` blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalVars {
    pub to_display_name: BTreeMap<String, String>,
    pub to_fixed: BTreeMap<String, String>,
    pub to_short: BTreeMap<String, String>,
}

impl LocalVars {
    fn slot_mut(&mut self, name: &str) -> Option<&mut BTreeMap<String, String>> {
        match name {
            TO_DISPLAY_NAME => Some(&mut self.to_display_name),
            TO_FIXED => Some(&mut self.to_fixed),
            TO_SHORT => Some(&mut self.to_short),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("{filename} is not valid UTF-8: {source}")]
    Encoding {
        filename: String,
        #[source]
        source: std::str::Utf8Error,
    },
    #[error("failed to parse HCL in {filename}: {message}")]
    Parse { filename: String, message: String },
    #[error("{filename}: a locals block takes no labels, found {count}")]
    UnexpectedLabels { filename: String, count: usize },
    #[error("{filename}: blocks are not allowed inside locals, found {name:?}")]
    NestedBlock { filename: String, name: String },
    #[error("{filename}: attribute {name:?} defined more than once in the same locals block")]
    DuplicateAttribute { filename: String, name: String },
}

/// Parses `contents` as HCL and collects the recognized locals maps.
///
/// `filename` only appears in diagnostics. A syntax error fails the whole call before any
/// block is looked at. Later `locals` blocks replace earlier values of the same attribute.
pub fn parse_locals(contents: &[u8], filename: &str) -> Result<LocalVars, ExtractError> {
    let text = std::str::from_utf8(contents).map_err(|e| {
        error!(error = ?e, filename, "Source is not valid UTF-8");
        ExtractError::Encoding {
            filename: filename.to_string(),
            source: e,
        }
    })?;

    let body = hcl::parse(text).map_err(|e| {
        error!(error = %e, filename, "Failed to parse HCL");
        ExtractError::Parse {
            filename: filename.to_string(),
            message: e.to_string(),
        }
    })?;

    let ctx = Context::new();
    let mut result = LocalVars::default();
    let mut blocks = 0usize;

    for block in body.blocks().filter(|b| b.identifier.as_str() == LOCALS_BLOCK) {
        blocks += 1;
        for attr in locals_attributes(block, filename)? {
            let name = attr.key.as_str();
            let Some(slot) = result.slot_mut(name) else {
                continue;
            };
            let Some(value) = evaluate_attribute(attr, &ctx) else {
                continue;
            };
            match value {
                Value::Object(map) => {
                    *slot = decode_string_map(&map);
                    debug!(attribute = name, entries = slot.len(), "Extracted locals map");
                }
                other => {
                    debug!(attribute = name, value = ?other, "Skipping non-object locals value");
                }
            }
        }
    }

    info!(
        filename,
        blocks,
        to_display_name = result.to_display_name.len(),
        to_fixed = result.to_fixed.len(),
        to_short = result.to_short.len(),
        "Extracted locals"
    );
    Ok(result)
}

/// Reads the attributes of a `locals` block.
///
/// Any attribute set is accepted, but labels, nested blocks and repeated names are not.
fn locals_attributes<'a>(
    block: &'a Block,
    filename: &str,
) -> Result<Vec<&'a Attribute>, ExtractError> {
    if !block.labels.is_empty() {
        error!(filename, labels = block.labels.len(), "Labelled locals block");
        return Err(ExtractError::UnexpectedLabels {
            filename: filename.to_string(),
            count: block.labels.len(),
        });
    }

    if let Some(nested) = block.body.blocks().next() {
        error!(filename, block = nested.identifier.as_str(), "Nested block inside locals");
        return Err(ExtractError::NestedBlock {
            filename: filename.to_string(),
            name: nested.identifier.as_str().to_string(),
        });
    }

    let mut seen = HashSet::new();
    let mut attrs = Vec::new();
    for attr in block.body.attributes() {
        if !seen.insert(attr.key.as_str()) {
            error!(filename, attribute = attr.key.as_str(), "Duplicate locals attribute");
            return Err(ExtractError::DuplicateAttribute {
                filename: filename.to_string(),
                name: attr.key.as_str().to_string(),
            });
        }
        attrs.push(attr);
    }
    Ok(attrs)
}

/// Evaluates an attribute expression, or `None` if it cannot be evaluated in `ctx`.
fn evaluate_attribute(attr: &Attribute, ctx: &Context) -> Option<Value> {
    match attr.expr.evaluate(ctx) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(attribute = attr.key.as_str(), error = %e, "Skipping unevaluable attribute");
            None
        }
    }
}

/// Keeps the entries of an object whose value is a string.
pub fn decode_string_map<'a, I>(entries: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (&'a String, &'a Value)>,
{
    entries
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(s) => Some((key.clone(), s.clone())),
            _ => None,
        })
        .collect()
}
