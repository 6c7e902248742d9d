/*!
 * Interactive collection of product settings
 *
 * Every question offers the previous run's answer as its default, so
 * re-running for an existing product only needs confirmation.
 */

use inquire::{Confirm, Select, Text};
use log::warn;
use uuid::Uuid;

use crate::error::Result;
use crate::settings::{Settings, SettingsStore, UiLevel};

/// Source of answers to setting questions
pub trait Prompter {
    /// Free text answer; empty input means `default`
    fn text(&mut self, message: &str, default: &str) -> Result<String>;

    /// Yes/no answer
    fn confirm(&mut self, message: &str, default: bool) -> Result<bool>;

    /// UI level choice
    fn select_ui_level(&mut self, message: &str, default: UiLevel) -> Result<UiLevel>;
}

/// Terminal prompts
#[derive(Debug, Default)]
pub struct InquirePrompter;

impl Prompter for InquirePrompter {
    fn text(&mut self, message: &str, default: &str) -> Result<String> {
        let mut prompt = Text::new(message);
        if !default.is_empty() {
            prompt = prompt.with_default(default);
        }
        Ok(prompt.prompt()?.trim().to_string())
    }

    fn confirm(&mut self, message: &str, default: bool) -> Result<bool> {
        Ok(Confirm::new(message).with_default(default).prompt()?)
    }

    fn select_ui_level(&mut self, message: &str, default: UiLevel) -> Result<UiLevel> {
        let cursor = UiLevel::ALL
            .iter()
            .position(|level| *level == default)
            .unwrap_or(0);
        Ok(Select::new(message, UiLevel::ALL.to_vec())
            .with_starting_cursor(cursor)
            .prompt()?)
    }
}

/// Accepts every default without asking
#[derive(Debug, Default)]
pub struct AcceptDefaults;

impl Prompter for AcceptDefaults {
    fn text(&mut self, _message: &str, default: &str) -> Result<String> {
        Ok(default.to_string())
    }

    fn confirm(&mut self, _message: &str, default: bool) -> Result<bool> {
        Ok(default)
    }

    fn select_ui_level(&mut self, _message: &str, default: UiLevel) -> Result<UiLevel> {
        Ok(default)
    }
}

/// Values given on the command line that take precedence over saved ones
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Default product name, ahead of the saved one
    pub product_name: Option<String>,
    /// Replacement product code
    pub product_id: Option<String>,
}

/// Ask for every setting, using `defaults` (the previous run) as defaults
///
/// On a fresh run, naming a product that has saved settings switches the
/// defaults to those settings.
pub fn collect_settings(
    defaults: Option<Settings>,
    prompter: &mut dyn Prompter,
    store: &SettingsStore,
    overrides: &Overrides,
) -> Result<Settings> {
    let fresh = defaults.is_none();
    let mut prior = defaults.unwrap_or_default();

    let default_name = overrides.product_name.as_deref().unwrap_or(&prior.product_name);
    let product_name = prompter.text("Product Name:", default_name)?;
    if fresh && !product_name.is_empty() {
        if let Some(saved) = store.load_product(&product_name) {
            prior = saved;
        }
    }

    let mut settings = Settings {
        product_name,
        ..Settings::default()
    };

    let default_version: &str = if prior.product_version.is_empty() {
        "1.0.0"
    } else {
        &prior.product_version
    };
    settings.product_version = prompter.text("Product Version (e.g., 1.0.0):", default_version)?;
    settings.manufacturer = prompter.text("Manufacturer:", &prior.manufacturer)?;

    settings.product_id = overrides
        .product_id
        .clone()
        .unwrap_or_else(|| prior.product_id.clone());
    settings.upgrade_code = ask_upgrade_code(prompter, &prior.upgrade_code)?;
    settings.ensure_identifiers();

    let default_install_dir: &str = if prior.install_dir_name.is_empty() {
        &settings.product_name
    } else {
        &prior.install_dir_name
    };
    settings.install_dir_name = prompter.text("Installation Directory Name:", default_install_dir)?;

    settings.ui_level = prompter.select_ui_level("Include UI?", prior.ui_level)?;

    if settings.ui_level.is_active() {
        settings.generate_license =
            prompter.confirm("Generate standard commercial license?", prior.generate_license)?;
        if !settings.generate_license {
            settings.license_file = prompter.text("License File Path (optional):", &prior.license_file)?;
        }
        settings.banner_image = prompter.text("Banner Image Path (optional):", &prior.banner_image)?;
        settings.dialog_image = prompter.text("Dialog Image Path (optional):", &prior.dialog_image)?;
    } else {
        settings.generate_license = false;
    }

    settings.icon_file = prompter.text("Icon File Path (optional):", &prior.icon_file)?;

    settings.add_desktop_shortcut =
        prompter.confirm("Add Desktop Shortcut?", prior.add_desktop_shortcut)?;
    settings.add_start_menu_shortcut =
        prompter.confirm("Add Start Menu Shortcut?", prior.add_start_menu_shortcut)?;
    if settings.add_start_menu_shortcut {
        let default_folder: &str = if prior.shortcut_folder_name.is_empty() {
            &settings.manufacturer
        } else {
            &prior.shortcut_folder_name
        };
        settings.shortcut_folder_name =
            prompter.text("Start Menu Shortcut Folder Name:", default_folder)?;
    }
    settings.shortcut_all_users =
        prompter.confirm("Create shortcuts for all users?", prior.shortcut_all_users)?;
    settings.run_after_install =
        prompter.confirm("Run program after installation?", prior.run_after_install)?;
    settings.add_to_path =
        prompter.confirm("Add application directory to PATH?", prior.add_to_path)?;
    settings.file_associations = prompter.text(
        "File extensions to associate (comma-separated, e.g., .txt,.doc):",
        &prior.file_associations,
    )?;

    settings.publish_dir = prior.publish_dir;
    settings.validate()?;
    Ok(settings)
}

/// Blank keeps the existing code (or generates one); anything else must be
/// a GUID
fn ask_upgrade_code(prompter: &mut dyn Prompter, existing: &str) -> Result<String> {
    loop {
        let answer = prompter.text("Upgrade Code (blank keeps the existing one):", existing)?;
        if answer.is_empty() {
            return Ok(Uuid::new_v4().to_string());
        }
        match Uuid::parse_str(&answer) {
            Ok(code) => return Ok(code.to_string()),
            Err(e) if answer != existing => warn!("'{}' is not a valid GUID: {}", answer, e),
            // Unusable saved value; asking again would return it again
            Err(_) => {
                warn!("Saved upgrade code '{}' is not a GUID, generating a new one", answer);
                return Ok(Uuid::new_v4().to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use tempfile::tempdir;

    /// Replays canned answers; an empty answer accepts the default
    struct Scripted(VecDeque<&'static str>);

    impl Scripted {
        fn new(answers: &[&'static str]) -> Self {
            Self(answers.iter().copied().collect())
        }

        fn next(&mut self) -> &'static str {
            self.0.pop_front().unwrap_or("")
        }
    }

    impl Prompter for Scripted {
        fn text(&mut self, _message: &str, default: &str) -> Result<String> {
            let answer = self.next();
            Ok(if answer.is_empty() { default } else { answer }.to_string())
        }

        fn confirm(&mut self, _message: &str, default: bool) -> Result<bool> {
            Ok(match self.next() {
                "" => default,
                answer => answer == "y",
            })
        }

        fn select_ui_level(&mut self, _message: &str, default: UiLevel) -> Result<UiLevel> {
            Ok(match self.next() {
                "" => default,
                answer => answer.parse().unwrap(),
            })
        }
    }

    #[test]
    fn fresh_run_generates_identifiers() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        let mut prompter = Scripted::new(&["Rocket", "2.0.0", "Acme"]);

        let settings =
            collect_settings(None, &mut prompter, &store, &Overrides::default()).unwrap();

        assert_eq!(settings.product_name, "Rocket");
        assert_eq!(settings.install_dir_name, "Rocket");
        assert_eq!(settings.shortcut_folder_name, "Acme");
        assert!(Uuid::parse_str(&settings.upgrade_code).is_ok());
        assert!(Uuid::parse_str(&settings.product_id).is_ok());
    }

    #[test]
    fn rerun_keeps_identifiers() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        let first = collect_settings(
            None,
            &mut Scripted::new(&["Rocket", "1.0.0", "Acme"]),
            &store,
            &Overrides::default(),
        )
        .unwrap();
        store.save(&first).unwrap();

        let second = collect_settings(
            store.load(None),
            &mut AcceptDefaults,
            &store,
            &Overrides::default(),
        )
        .unwrap();

        assert_eq!(second.upgrade_code, first.upgrade_code);
        assert_eq!(second.product_id, first.product_id);
        assert_eq!(second, first);
    }

    #[test]
    fn naming_a_saved_product_reuses_its_settings() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        let first = collect_settings(
            None,
            &mut Scripted::new(&["Rocket", "1.0.0", "Acme"]),
            &store,
            &Overrides::default(),
        )
        .unwrap();
        store.save(&first).unwrap();

        let second = collect_settings(
            None,
            &mut Scripted::new(&["Rocket", "1.1.0"]),
            &store,
            &Overrides::default(),
        )
        .unwrap();

        assert_eq!(second.product_version, "1.1.0");
        assert_eq!(second.manufacturer, "Acme");
        assert_eq!(second.upgrade_code, first.upgrade_code);
    }

    #[test]
    fn overrides_win_over_saved_values() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        let prior = Settings {
            product_name: "Rocket".to_string(),
            product_id: Uuid::new_v4().to_string(),
            upgrade_code: Uuid::new_v4().to_string(),
            ..Default::default()
        };
        let forced = "4a1e6b7c-2d3f-4e5a-8b9c-0d1e2f3a4b5c".to_string();
        let overrides = Overrides {
            product_id: Some(forced.clone()),
            ..Default::default()
        };
        let new_code = "11111111-2222-4333-8444-555555555555";

        let settings = collect_settings(
            Some(prior),
            &mut Scripted::new(&["", "", "", new_code]),
            &store,
            &overrides,
        )
        .unwrap();

        assert_eq!(settings.product_id, forced);
        assert_eq!(settings.upgrade_code, new_code);
    }

    #[test]
    fn invalid_upgrade_code_is_asked_again() {
        let mut prompter = Scripted::new(&["not-a-guid", "11111111-2222-4333-8444-555555555555"]);
        let code = ask_upgrade_code(&mut prompter, "").unwrap();
        assert_eq!(code, "11111111-2222-4333-8444-555555555555");
    }

    #[test]
    fn no_ui_skips_license_questions() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        // name, version, manufacturer, upgrade, install dir, ui, icon, desktop
        let mut prompter = Scripted::new(&["Rocket", "", "Acme", "", "", "none", "", "n"]);

        let settings =
            collect_settings(None, &mut prompter, &store, &Overrides::default()).unwrap();

        assert_eq!(settings.ui_level, UiLevel::None);
        assert!(!settings.generate_license);
        assert!(!settings.add_desktop_shortcut);
    }

    #[test]
    fn product_name_override_is_the_default_answer() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        let overrides = Overrides {
            product_name: Some("publish".to_string()),
            ..Default::default()
        };

        let settings = collect_settings(None, &mut AcceptDefaults, &store, &overrides).unwrap();

        assert_eq!(settings.product_name, "publish");
        assert_eq!(settings.product_version, "1.0.0");
    }

    #[test]
    fn empty_product_name_is_rejected() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        let result = collect_settings(None, &mut AcceptDefaults, &store, &Overrides::default());
        assert!(result.is_err());
    }
}
