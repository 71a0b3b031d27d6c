use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::types::Target;
use crate::ConfigError;

#[derive(Debug, Deserialize)]
pub struct TargetsFile {
    pub targets: Vec<Target>,
}

/// The built-in target list used when no targets file is configured.
#[must_use]
pub fn default_targets() -> Vec<Target> {
    (0..10)
        .map(|n| Target::new(n + 1, format!("https://example{n}.com/")))
        .collect()
}

/// Load and validate a target list from a YAML file of the form
/// `targets: [{ id: 1, url: "https://..." }, ...]`.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_targets(path: &Path) -> Result<Vec<Target>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TargetsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: TargetsFile = serde_yaml::from_str(&content)?;
    validate_targets(&file.targets)?;

    Ok(file.targets)
}

pub(crate) fn validate_targets(targets: &[Target]) -> Result<(), ConfigError> {
    if targets.is_empty() {
        return Err(ConfigError::Validation(
            "target list must contain at least one entry".to_string(),
        ));
    }

    let mut seen_ids = HashSet::new();
    for target in targets {
        let url = target.url.trim();
        if url.is_empty() {
            return Err(ConfigError::Validation(format!(
                "target {} has an empty url",
                target.id
            )));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "target {} url '{}' must start with http:// or https://",
                target.id, target.url
            )));
        }
        if !seen_ids.insert(target.id) {
            return Err(ConfigError::Validation(format!(
                "duplicate target id: {}",
                target.id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "targets_test.rs"]
mod tests;
