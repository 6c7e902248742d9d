/*!
 * Product settings and their persistence between runs
 *
 * Settings are stored as pretty JSON next to the working directory, once
 * under the product name and once as `last_project.json`.
 */

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::ensure;
use crate::error::{Result, ResultExt};

/// File name of the pointer to the most recently used settings
pub const LAST_PROJECT_FILE: &str = "last_project.json";

/// Installer user interface level
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum UiLevel {
    /// Install directory selection and installation options dialog
    #[default]
    Full,
    /// License acceptance only
    Minimal,
    /// No UI at all
    None,
}

impl UiLevel {
    /// All levels, in prompt order
    pub const ALL: [UiLevel; 3] = [UiLevel::Full, UiLevel::Minimal, UiLevel::None];

    /// Whether the installer shows any dialogs
    pub fn is_active(self) -> bool {
        self != UiLevel::None
    }
}

impl<'de> Deserialize<'de> for UiLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or_else(|_| {
            warn!("Unknown ui_level '{}', using '{}'", raw, UiLevel::default());
            UiLevel::default()
        }))
    }
}

/// Settings for one product
///
/// Unknown keys in saved files are ignored and missing keys take their
/// defaults, so files written by older versions keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub product_name: String,
    pub product_version: String,
    pub manufacturer: String,
    /// Product code, generated once
    pub product_id: String,
    /// Upgrade code, must stay the same across versions
    pub upgrade_code: String,
    pub install_dir_name: String,
    pub ui_level: UiLevel,
    pub generate_license: bool,
    pub license_file: String,
    pub banner_image: String,
    pub dialog_image: String,
    pub icon_file: String,
    pub add_desktop_shortcut: bool,
    pub add_start_menu_shortcut: bool,
    pub shortcut_folder_name: String,
    pub shortcut_all_users: bool,
    pub run_after_install: bool,
    pub add_to_path: bool,
    /// Comma-separated extensions, e.g. `.txt,.doc`
    pub file_associations: String,
    /// Source directory of the last run
    pub publish_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            product_name: String::new(),
            product_version: String::new(),
            manufacturer: String::new(),
            product_id: String::new(),
            upgrade_code: String::new(),
            install_dir_name: String::new(),
            ui_level: UiLevel::Full,
            generate_license: true,
            license_file: String::new(),
            banner_image: String::new(),
            dialog_image: String::new(),
            icon_file: String::new(),
            add_desktop_shortcut: true,
            add_start_menu_shortcut: true,
            shortcut_folder_name: String::new(),
            shortcut_all_users: false,
            run_after_install: false,
            add_to_path: false,
            file_associations: String::new(),
            publish_dir: None,
        }
    }
}

impl Settings {
    /// Fill in product id and upgrade code if they were never generated
    pub fn ensure_identifiers(&mut self) {
        if self.product_id.trim().is_empty() {
            self.product_id = Uuid::new_v4().to_string();
        }
        if self.upgrade_code.trim().is_empty() {
            self.upgrade_code = Uuid::new_v4().to_string();
        }
    }

    /// Configured file extensions, trimmed, empties dropped
    pub fn extensions(&self) -> Vec<String> {
        self.file_associations
            .split(',')
            .map(str::trim)
            .filter(|ext| !ext.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Directory under the manufacturer folder to install into
    pub fn install_dir(&self) -> &str {
        if self.install_dir_name.is_empty() {
            &self.product_name
        } else {
            &self.install_dir_name
        }
    }

    /// Check the fields the generated project cannot do without
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.product_name.trim().is_empty(),
            Settings,
            "product name must not be empty"
        );
        ensure!(
            !self
                .product_name
                .contains(|c: char| matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')),
            Settings,
            "product name '{}' cannot be used as a file name",
            self.product_name
        );
        ensure!(
            Uuid::parse_str(&self.upgrade_code).is_ok(),
            Settings,
            "upgrade code '{}' is not a GUID",
            self.upgrade_code
        );
        Ok(())
    }
}

/// Loads and saves settings files in one directory
#[derive(Debug, Clone)]
pub struct SettingsStore {
    dir: PathBuf,
}

impl SettingsStore {
    /// Create a store rooted at a directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the settings file for a product
    pub fn product_path(&self, product_name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", product_name))
    }

    /// Path of the last-used settings file
    pub fn last_project_path(&self) -> PathBuf {
        self.dir.join(LAST_PROJECT_FILE)
    }

    /// Load settings for a product, falling back to the last-used settings
    pub fn load(&self, product_name: Option<&str>) -> Option<Settings> {
        if let Some(settings) = product_name.and_then(|name| self.load_product(name)) {
            return Some(settings);
        }

        let settings = self.read_file(&self.last_project_path())?;
        info!("Loaded settings from last project");
        Some(settings)
    }

    /// Load settings saved under a product name, without fallback
    pub fn load_product(&self, product_name: &str) -> Option<Settings> {
        let path = self.product_path(product_name);
        let settings = self.read_file(&path)?;
        info!("Loaded settings from {}", path.display());
        Some(settings)
    }

    /// Write the product settings file and overwrite the last-used file
    pub fn save(&self, settings: &Settings) -> Result<PathBuf> {
        let json = to_json(settings)?;
        let path = self.product_path(&settings.product_name);

        fs::write(&path, &json).with_context(|| format!("writing {}", path.display()))?;
        fs::write(self.last_project_path(), &json)
            .with_context(|| format!("writing {}", self.last_project_path().display()))?;

        info!("Settings saved to {}", path.display());
        Ok(path)
    }

    fn read_file(&self, path: &Path) -> Option<Settings> {
        if !path.exists() {
            return None;
        }

        let parsed = fs::read_to_string(path)
            .map_err(crate::error::WixGenError::from)
            .and_then(|text| Ok(serde_json::from_str::<Settings>(&text)?));

        match parsed {
            Ok(settings) => Some(settings),
            Err(e) => {
                warn!("Error loading settings from {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Serialize with four-space indentation
fn to_json(settings: &Settings) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    settings.serialize(&mut serializer)?;
    buf.push(b'\n');
    Ok(buf)
}
