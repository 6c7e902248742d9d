/*!
 * Identifier sanitization for WiX element ids
 *
 * WiX identifiers may only contain ASCII letters, digits, underscores and
 * periods. Every other character of a path segment is replaced with `_`.
 * The mapping is a pure function of its input and is not injective:
 * `my-app` and `my app` both become `my_app`.
 */

use std::path::{Component, Path};

/// Id of the installation root directory
pub const INSTALL_DIR_ID: &str = "INSTALLDIR";

/// Prefix for generated directory ids
pub const DIRECTORY_PREFIX: &str = "Dir_";

/// Replace every character outside `[A-Za-z0-9_.]` with `_`
pub fn sanitize_identifier(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Directory id for a single path segment
pub fn directory_id(segment: &str) -> String {
    format!("{}{}", DIRECTORY_PREFIX, sanitize_identifier(segment))
}

/// Directory id for a relative directory path, derived from its final segment
///
/// The empty path is the installation root.
pub fn directory_id_for(rel_path: &Path) -> String {
    match path_segments(rel_path).last() {
        Some(last) => directory_id(&last),
        None => INSTALL_DIR_ID.to_string(),
    }
}

/// Identifier fragment for a file extension (`.txt` -> `TXT`)
pub fn extension_id(extension: &str) -> String {
    sanitize_identifier(&extension.replace('.', "")).to_ascii_uppercase()
}

/// Split a relative path into its normal segments, whatever the separator style
pub fn path_segments(rel_path: &Path) -> Vec<String> {
    rel_path
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            _ => None,
        })
        .flat_map(|part| {
            // Backslash separated paths saved on another platform
            part.split('\\')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}
