pub mod check;
pub mod config_cmd;
pub mod merge;
pub mod replay;

use std::path::Path;

use splice_core::ContentClass;

/// An explicit `--class` wins; otherwise guess from the file extension.
pub fn resolve_class(
    explicit: Option<&str>,
    path: Option<&Path>,
) -> Result<ContentClass, Box<dyn std::error::Error>> {
    match (explicit, path) {
        (Some(tag), _) => Ok(tag.parse::<ContentClass>()?),
        (None, Some(path)) => Ok(ContentClass::from_path(path)),
        (None, None) => Ok(ContentClass::Freeform),
    }
}

pub fn read_file(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()).into())
}
