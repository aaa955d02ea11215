//! Argument binder – splits a tag's raw parameter text into positional and
//! keyword arguments.
//!
//! The split is a plain comma split with no awareness of nesting or escaped
//! commas. A token is read as `key=value` only when the key part holds no
//! space and the token does not start with `=` or a quote; free text may
//! legitimately contain `=`. No numeric coercion happens here; operations
//! parse the strings themselves through the typed accessors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Bound arguments of one tag invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Args {
    pub positional: Vec<String>,
    pub keyword: BTreeMap<String, String>,
}

/// Bind a raw parameter string (the text between the parentheses).
pub fn bind(raw: &str) -> Args {
    let mut args = Args::default();
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match split_keyword(token) {
            Some((key, value)) => {
                args.keyword
                    .insert(key.to_string(), unquote(value.trim()).to_string());
            }
            None => args.positional.push(unquote(token).to_string()),
        }
    }
    args
}

fn split_keyword(token: &str) -> Option<(&str, &str)> {
    if token.starts_with(['=', '"', '\'']) {
        return None;
    }
    let (key, value) = token.split_once('=')?;
    if key.contains(' ') {
        return None;
    }
    Some((key, value))
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    match bytes {
        [first, .., last] if first == last && (*first == b'"' || *first == b'\'') => {
            &value[1..value.len() - 1]
        }
        _ => value,
    }
}

impl Args {
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// Serialise back into a parameter string that [`bind`] reads as the
    /// same positional/keyword split.
    pub fn to_params(&self) -> String {
        let positional = self.positional.iter().map(|p| {
            if p.contains('=') || p.starts_with(['"', '\'']) {
                format!("\"{p}\"")
            } else {
                p.clone()
            }
        });
        let keyword = self.keyword.iter().map(|(k, v)| format!("{k}={v}"));
        positional.chain(keyword).collect::<Vec<_>>().join(", ")
    }

    /// The argument named `key`, falling back to position `index`.
    pub fn value(&self, index: usize, key: &str) -> Option<&str> {
        self.keyword
            .get(key)
            .or_else(|| self.positional.get(index))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn text(&self, command: &str, index: usize, key: &str) -> Result<&str, RenderError> {
        self.value(index, key).ok_or_else(|| RenderError::MissingArgument {
            command: command.to_string(),
            name: key.to_string(),
        })
    }

    pub fn opt_float(&self, command: &str, index: usize, key: &str) -> Result<Option<f32>, RenderError> {
        self.value(index, key)
            .map(|v| parse_number(command, v))
            .transpose()
    }

    pub fn float(&self, command: &str, index: usize, key: &str) -> Result<f32, RenderError> {
        parse_number(command, self.text(command, index, key)?)
    }

    pub fn opt_int(&self, command: &str, index: usize, key: &str) -> Result<Option<i64>, RenderError> {
        self.value(index, key)
            .map(|v| {
                v.trim().parse::<i64>().map_err(|e| RenderError::InvalidArgument {
                    command: command.to_string(),
                    value: v.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    pub fn int(&self, command: &str, index: usize, key: &str) -> Result<i64, RenderError> {
        self.opt_int(command, index, key)?
            .ok_or_else(|| RenderError::MissingArgument {
                command: command.to_string(),
                name: key.to_string(),
            })
    }
}

fn parse_number(command: &str, value: &str) -> Result<f32, RenderError> {
    match value.trim().parse::<f32>() {
        Ok(n) if n.is_finite() => Ok(n),
        Ok(_) => Err(RenderError::InvalidArgument {
            command: command.to_string(),
            value: value.to_string(),
            reason: "not a finite number".to_string(),
        }),
        Err(e) => Err(RenderError::InvalidArgument {
            command: command.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}
