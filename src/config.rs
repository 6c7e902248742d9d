/*!
 * Configuration handling for wixgen
 */

use std::path::PathBuf;

use clap::Parser;
use clap_complete::Shell;
use uuid::Uuid;

use crate::error::Result;
use crate::prompt::Overrides;
use crate::{bail, ensure};

/// Command-line arguments for wixgen
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "wixgen",
    version = env!("CARGO_PKG_VERSION"),
    about = "Create a WiX installer project from a directory of published files",
    long_about = "Scans a publish directory and generates a WiX package description (.wxs), \
                  a build project (.wixproj) and build instructions.\n\n\
                  Without SOURCE_DIR the settings of the last project (last_project.json) \
                  are loaded and, after confirmation, reused."
)]
pub struct Args {
    /// Directory containing the files to include in the installer
    pub source_dir: Option<String>,

    /// Output directory for the installer project
    #[clap(short, long, default_value = "Installer")]
    pub output_dir: String,

    /// Directory holding <product>.json and last_project.json
    #[clap(long, default_value = ".")]
    pub settings_dir: String,

    /// Accept every default without prompting
    #[clap(short = 'y', long)]
    pub yes: bool,

    /// Product name offered as the default answer
    #[clap(long, value_name = "NAME")]
    pub product_name: Option<String>,

    /// Use this product code instead of the saved one
    #[clap(long, value_name = "GUID")]
    pub product_id: Option<String>,

    /// Generate shell completions
    #[clap(long = "generate", value_enum)]
    pub generate: Option<Shell>,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory to package, if given on the command line
    pub source_dir: Option<PathBuf>,

    /// Output directory for the generated project
    pub output_dir: PathBuf,

    /// Directory for settings files
    pub settings_dir: PathBuf,

    /// Accept defaults instead of prompting
    pub assume_yes: bool,

    /// Default product name
    pub product_name: Option<String>,

    /// Product code override
    pub product_id: Option<String>,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args(args: Args) -> Self {
        Self {
            source_dir: args.source_dir.map(PathBuf::from),
            output_dir: PathBuf::from(args.output_dir),
            settings_dir: PathBuf::from(args.settings_dir),
            assume_yes: args.yes,
            product_name: args.product_name,
            product_id: args.product_id,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(id) = &self.product_id {
            if Uuid::parse_str(id).is_err() {
                bail!(InvalidArgument, "--product-id '{}' is not a GUID", id);
            }
        }

        if let Some(dir) = &self.source_dir {
            ensure!(
                dir.is_dir(),
                InvalidSource,
                "'{}' does not exist or is not a directory",
                dir.display()
            );
        }

        ensure!(
            !self.settings_dir.exists() || self.settings_dir.is_dir(),
            InvalidArgument,
            "settings directory '{}' is not a directory",
            self.settings_dir.display()
        );

        Ok(())
    }

    /// Command-line values that override saved settings
    pub fn overrides(&self) -> Overrides {
        Overrides {
            product_name: self.product_name.clone(),
            product_id: self.product_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn parse(argv: &[&str]) -> Config {
        Config::from_args(Args::parse_from(argv))
    }

    #[test]
    fn defaults() {
        let config = parse(&["wixgen"]);
        assert!(config.source_dir.is_none());
        assert_eq!(config.output_dir, PathBuf::from("Installer"));
        assert_eq!(config.settings_dir, PathBuf::from("."));
        assert!(!config.assume_yes);
    }

    #[test]
    fn output_dir_flag() {
        let config = parse(&["wixgen", "publish", "-o", "Setup", "-y"]);
        assert_eq!(config.source_dir, Some(PathBuf::from("publish")));
        assert_eq!(config.output_dir, PathBuf::from("Setup"));
        assert!(config.assume_yes);
    }

    #[test]
    fn rejects_missing_source_and_bad_product_id() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");
        let config = parse(&["wixgen", missing.to_str().unwrap()]);
        assert!(config.validate().unwrap_err().is_usage_error());

        let config = parse(&["wixgen", "--product-id", "nope"]);
        assert!(config.validate().is_err());
    }
}
