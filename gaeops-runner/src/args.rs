// Flag rendering for gcloud command lines.
// An unset value renders to no tokens at all.

use std::path::Path;

fn flag(name: &str) -> String {
    format!("--{}", name)
}

/// `--name value`, or nothing when `value` is unset.
pub fn string_flag(name: &str, value: Option<&str>) -> Vec<String> {
    match value {
        Some(value) => vec![flag(name), value.to_string()],
        None => Vec::new(),
    }
}

/// `--name true|false`, or nothing when `value` is unset.
pub fn bool_flag(name: &str, value: Option<bool>) -> Vec<String> {
    match value {
        Some(value) => vec![flag(name), value.to_string()],
        None => Vec::new(),
    }
}

/// `--name <path>` with the path passed through as given.
pub fn path_flag(name: &str, value: Option<&Path>) -> Vec<String> {
    match value {
        Some(path) => vec![flag(name), path.to_string_lossy().into_owned()],
        None => Vec::new(),
    }
}
