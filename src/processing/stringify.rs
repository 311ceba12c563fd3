use std::str::FromStr;

use crate::cfn_yaml::dumper::{DumpOptions, Dumper};
use crate::cfn_yaml::errors::{Error, Result};
use crate::cfn_yaml::loader::Loader;
use crate::cfn_yaml::mappings::{CLOUDFORMATION_TAGS, TO_STRING_TAG};
use crate::cfn_yaml::parser::Node;
use crate::cfn_yaml::types::Value;

/// Target text format of `!ToString`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConvertTo {
    #[default]
    JsonString,
    YamlString,
}

impl FromStr for ConvertTo {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "JSONString" => Ok(ConvertTo::JsonString),
            "YAMLString" => Ok(ConvertTo::YamlString),
            other => Err(format!("unsupported ConvertTo value: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StringifyOptions {
    pub convert_to: ConvertTo,
    /// Collapse the result onto a single line.
    pub one_line: bool,
}

impl StringifyOptions {
    /// Reads `{ConvertTo: ..., OneLine: ...}`; unknown keys are ignored.
    pub fn from_value(value: &Value, at: &str) -> Result<Self> {
        let map = value.as_mapping().ok_or_else(|| Error::InvalidOptionsType {
            tag: TO_STRING_TAG.to_string(),
            path: at.to_string(),
            found: value.kind_name(),
        })?;

        let mut options = StringifyOptions::default();
        if let Some(convert_to) = map.get("ConvertTo") {
            options.convert_to = convert_to
                .as_str()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| Error::InvalidOptionValue {
                    tag: TO_STRING_TAG.to_string(),
                    path: at.to_string(),
                    option: "ConvertTo".to_string(),
                    message: format!(
                        "must be \"YAMLString\" or \"JSONString\", got {}",
                        convert_to.to_json_value()
                    ),
                })?;
        }
        if let Some(one_line) = map.get("OneLine") {
            options.one_line = match one_line {
                Value::Bool(b) => *b,
                other => {
                    return Err(Error::InvalidOptionValue {
                        tag: TO_STRING_TAG.to_string(),
                        path: at.to_string(),
                        option: "OneLine".to_string(),
                        message: format!("must be a boolean, got {}", other.to_json_value()),
                    })
                }
            };
        }
        Ok(options)
    }
}

/// Replaces a `!ToString [value, options?]` node with the rendered string.
pub(crate) fn construct_to_string(loader: &mut Loader<'_>, node: Node) -> Result<Value> {
    let at = loader.node_path();
    let items = match node {
        Node::Sequence { items, .. } => items,
        other => {
            return Err(Error::TagShape {
                tag: TO_STRING_TAG.to_string(),
                path: at,
                expected: "sequence".to_string(),
                found: other.kind_name(),
            })
        }
    };

    let mut values = loader.construct_sequence(items)?.into_iter();
    let value = values.next().ok_or_else(|| Error::MissingArgument {
        tag: TO_STRING_TAG.to_string(),
        path: at.clone(),
        message: "requires at least one parameter".to_string(),
    })?;
    let options = match values.next() {
        Some(options) => StringifyOptions::from_value(&options, &at)?,
        None => StringifyOptions::default(),
    };
    stringify(&value, options).map(Value::String)
}

/// Renders a resolved value as text.
///
/// Strings pass through. Other scalars are spelled `None`, `True`, `False` or
/// as the number. Collections and tagged values are rendered as JSON (2-space
/// indent, or compact with `one_line`) or YAML (block, or flow with `one_line`),
/// after tags are rewritten to `{ "!Tag": payload }`.
pub fn stringify(value: &Value, options: StringifyOptions) -> Result<String> {
    let text = match value {
        Value::String(s) => {
            if options.one_line {
                s.replace('\n', " ")
            } else {
                s.clone()
            }
        }
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Int(i) => i.to_string(),
        Value::UInt(u) => u.to_string(),
        Value::Float(f) => float_text(*f),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => {
            let prepared = value.to_display_form();
            match options.convert_to {
                ConvertTo::JsonString => {
                    let json = prepared.to_json_value();
                    if options.one_line {
                        serde_json::to_string(&json)?
                    } else {
                        serde_json::to_string_pretty(&json)?
                    }
                }
                ConvertTo::YamlString => {
                    let dump_options = DumpOptions::default().with_flow_style(options.one_line);
                    let yaml = Dumper::new(&CLOUDFORMATION_TAGS)
                        .with_options(dump_options)
                        .dump_value(&prepared)?;
                    yaml.trim_end_matches('\n').to_string()
                }
            }
        }
    };
    Ok(text)
}

fn float_text(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() && f > 0.0 {
        "inf".to_string()
    } else if f.is_infinite() {
        "-inf".to_string()
    } else {
        format!("{:?}", f)
    }
}
