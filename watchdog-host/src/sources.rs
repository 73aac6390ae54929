//! Loading beacon configuration fragments from YAML files.

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::Value;

/// Read fragments from every file, in order.
pub fn load_fragments(paths: &[impl AsRef<Path>]) -> Result<Vec<Value>> {
    let mut fragments = Vec::new();
    for path in paths {
        fragments.extend(load_file(path.as_ref())?);
    }
    Ok(fragments)
}

/// A file holds either one mapping or a list of mappings.
fn load_file(path: &Path) -> Result<Vec<Value>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_fragments(&text).with_context(|| format!("invalid config in {}", path.display()))
}

pub fn parse_fragments(text: &str) -> Result<Vec<Value>> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(text)?;
    let value = serde_json::to_value(yaml)?;

    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(_) => Ok(vec![value]),
        Value::Array(fragments) => Ok(fragments),
        other => bail!("expected a mapping or a list of mappings, found {other}"),
    }
}
