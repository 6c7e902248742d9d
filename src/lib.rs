/*!
 * wixgen - Generate WiX installer projects from a publish directory
 *
 * This library scans a directory of published files and builds the WiX
 * package description (`.wxs`) and SDK build project (`.wixproj`) that
 * install them, remembering product settings between runs.
 */

pub mod assembler;
pub mod config;
pub mod element;
pub mod error;
pub mod ident;
pub mod license;
pub mod project;
pub mod prompt;
pub mod report;
pub mod scanner;
pub mod settings;
pub mod types;
pub mod utils;
pub mod writer;

#[cfg(test)]
mod tests;

// Re-export main components for easier access
pub use assembler::{Assembler, PackageTree};
pub use config::Config;
pub use element::Element;
pub use error::{Result, WixGenError};
pub use ident::sanitize_identifier;
pub use project::{GenerationReport, ProjectGenerator};
pub use report::{ReportFormat, Reporter};
pub use scanner::Scanner;
pub use settings::{Settings, SettingsStore, UiLevel};
pub use types::{FileEntry, ScanResult};
pub use utils::format_file_size;
pub use writer::{WriteOutcome, XmlWriter};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
