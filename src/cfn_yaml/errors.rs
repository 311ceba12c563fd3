// Copyright 2020-2022 Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
//
// This module contains code adapted from AWS CloudFormation Guard
// https://github.com/aws-cloudformation/cloudformation-guard
// See readme.md for attribution details

use std::path::PathBuf;
use thiserror::Error;

use super::parser;
use super::types::Location;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while loading, processing or dumping a template.
#[derive(Debug, Error)]
pub enum Error {
    #[error("YAML syntax error: {message}")]
    Syntax {
        location: Option<Location>,
        message: String,
    },

    #[error("{tag} at {path}: expected a {expected} node, but found a {found}")]
    TagShape {
        tag: String,
        path: String,
        expected: String,
        found: &'static str,
    },

    #[error("unknown tag {tag} at {path}")]
    UnknownTag { tag: String, path: String },

    #[error("tag {0} is already registered")]
    DuplicateTag(String),

    #[error("{tag} at {path}: {message}")]
    MissingArgument {
        tag: String,
        path: String,
        message: String,
    },

    #[error("{tag} at {path}: optional parameters must be a mapping, but found a {found}")]
    InvalidOptionsType {
        tag: String,
        path: String,
        found: &'static str,
    },

    #[error("{tag} at {path}: {option} {message}")]
    InvalidOptionValue {
        tag: String,
        path: String,
        option: String,
        message: String,
    },

    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("error reading file {}: {source}", path.display())]
    IncludeResolution {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("include cycle detected at {}: {}", path.display(), format_chain(chain))]
    IncludeCycle { path: PathBuf, chain: Vec<PathBuf> },

    #[error("mapping key at {path} must be a scalar, but found a {found}")]
    InvalidKey { path: String, found: &'static str },

    #[error("merge key at {path} expects a mapping or a sequence of mappings, but found a {found}")]
    InvalidMerge { path: String, found: &'static str },

    #[error("{tag} at {path}: {text:?} is not a valid value")]
    InvalidScalar {
        tag: String,
        path: String,
        text: String,
    },

    #[error("template root must be a mapping, but found a {found}")]
    InvalidRoot { found: &'static str },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML emitter error: {0}")]
    Emit(String),
}

impl Error {
    pub(crate) fn include(path: impl Into<PathBuf>, source: impl Into<Error>) -> Self {
        Error::IncludeResolution {
            path: path.into(),
            source: Box::new(source.into()),
        }
    }

    /// The innermost error, following include wrappers down to the failure that started it.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::IncludeResolution { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<serde_yml::libyml::error::Error> for Error {
    fn from(err: serde_yml::libyml::error::Error) -> Self {
        Error::Syntax {
            location: Some(parser::location(&err.mark())),
            message: err.to_string(),
        }
    }
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_shape_message_names_tag_and_path() {
        let err = Error::TagShape {
            tag: "!Sub".to_string(),
            path: "Resources.Bucket.Properties.Name".to_string(),
            expected: "sequence or scalar".to_string(),
            found: "mapping",
        };
        assert_eq!(
            err.to_string(),
            "!Sub at Resources.Bucket.Properties.Name: expected a sequence or scalar node, but found a mapping"
        );
    }

    #[test]
    fn test_include_cycle_message_lists_chain() {
        let err = Error::IncludeCycle {
            path: PathBuf::from("/t/a.yaml"),
            chain: vec![PathBuf::from("/t/a.yaml"), PathBuf::from("/t/b.yaml")],
        };
        let msg = err.to_string();
        assert!(msg.contains("/t/a.yaml -> /t/b.yaml"));
    }

    #[test]
    fn test_root_cause_unwraps_nested_includes() {
        let inner = Error::FileNotFound {
            path: PathBuf::from("missing.yaml"),
        };
        let err = Error::include("/t/b.yaml", Error::include("/t/a.yaml", inner));
        assert!(matches!(err.root_cause(), Error::FileNotFound { .. }));
        assert!(err.to_string().contains("/t/b.yaml"));
    }
}
