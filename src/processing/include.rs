use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::cfn_yaml::errors::{Error, Result};
use crate::cfn_yaml::loader::Loader;
use crate::cfn_yaml::mappings::INCLUDE_FILE_TAG;
use crate::cfn_yaml::parser::Node;
use crate::cfn_yaml::types::Value;

/// How the content of an included file is turned into a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeFormat {
    /// Loaded with the including loader, so tags inside are resolved too.
    Yaml,
    Json,
    /// Inserted as a string, unchanged.
    Text,
}

impl IncludeFormat {
    /// Picks the format from the file extension (case-insensitive), falling back
    /// to the media type guessed from the file name.
    pub fn detect(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("yaml") | Some("yml") => IncludeFormat::Yaml,
            Some("json") => IncludeFormat::Json,
            _ if guess_media_type(path).is_some_and(|media| media.contains("json")) => {
                IncludeFormat::Json
            }
            _ => IncludeFormat::Text,
        }
    }
}

const MEDIA_TYPES: [(&str, &str); 14] = [
    ("json", "application/json"),
    ("geojson", "application/geo+json"),
    ("jsonld", "application/ld+json"),
    ("webmanifest", "application/manifest+json"),
    ("har", "application/json"),
    ("yaml", "application/yaml"),
    ("yml", "application/yaml"),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("html", "text/html"),
    ("xml", "application/xml"),
    ("sh", "application/x-sh"),
    ("py", "text/x-python"),
    ("sql", "application/sql"),
];

/// Media type for a file name, judged by extension only.
pub fn guess_media_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    MEDIA_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, media)| *media)
}

/// Replaces an `!IncludeFile` node with the content of the file it names.
pub(crate) fn resolve_include(loader: &Loader<'_>, node: Node) -> Result<Value> {
    let at = loader.node_path();
    let raw = node.into_scalar_text().map_err(|node| Error::TagShape {
        tag: INCLUDE_FILE_TAG.to_string(),
        path: at.clone(),
        expected: "scalar".to_string(),
        found: node.kind_name(),
    })?;
    if raw.is_empty() {
        return Err(Error::MissingArgument {
            tag: INCLUDE_FILE_TAG.to_string(),
            path: at,
            message: "must specify a file path".to_string(),
        });
    }
    let path = resolve_path(Path::new(&raw), loader.origin())?;
    include_file(loader, &path)
}

/// Absolute paths are kept; relative ones are joined to the including document's
/// directory, or to the working directory when there is no including document.
pub fn resolve_path(raw: &Path, including: Option<&Path>) -> Result<PathBuf> {
    let joined = if raw.is_absolute() {
        raw.to_path_buf()
    } else if let Some(document) = including {
        document
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(raw)
    } else {
        std::env::current_dir()?.join(raw)
    };
    Ok(normalize_path(&joined))
}

/// Removes `.` and `..` components without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

fn include_file(loader: &Loader<'_>, path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let canonical = fs::canonicalize(path).map_err(|e| Error::include(path, e))?;
    if loader.ancestors().contains(&canonical) {
        let mut chain = loader.ancestors().to_vec();
        chain.push(canonical);
        return Err(Error::IncludeCycle {
            path: path.to_path_buf(),
            chain,
        });
    }

    let format = IncludeFormat::detect(path);
    tracing::debug!(path = %path.display(), ?format, "Resolving included file");
    let content = fs::read_to_string(path).map_err(|e| Error::include(path, e))?;

    match format {
        IncludeFormat::Yaml => loader
            .nested(path.to_path_buf(), canonical)
            .load_value(&content)
            .map_err(|e| Error::include(path, e)),
        IncludeFormat::Json => serde_json::from_str(&content)
            .map(Value::from_json_value)
            .map_err(|e| Error::include(path, e)),
        IncludeFormat::Text => Ok(Value::String(content)),
    }
}
