/*!
 * Command-line interface for wixgen
 */

use std::io;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};

use wixgen::config::{Args, Config};
use wixgen::error::Result;
use wixgen::license::generate_license_rtf;
use wixgen::project::ProjectGenerator;
use wixgen::prompt::{collect_settings, AcceptDefaults, InquirePrompter, Prompter};
use wixgen::report::{ReportFormat, Reporter};
use wixgen::scanner::{validate_source, Scanner};
use wixgen::settings::{Settings, SettingsStore};
use wixgen::VERSION;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    // Parse command line arguments
    let args = Args::parse();

    if let Some(shell) = args.generate {
        let mut command = Args::command();
        clap_complete::generate(shell, &mut command, "wixgen", &mut io::stdout());
        return;
    }

    let config = Config::from_args(args);

    let exit_code = match run(&config) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{}", e);
            1
        }
    };

    process::exit(exit_code);
}

fn run(config: &Config) -> Result<i32> {
    config.validate()?;

    println!("wixgen v{} - WiX installer project creator", VERSION);

    let store = SettingsStore::new(&config.settings_dir);
    let mut prompter: Box<dyn Prompter> = if config.assume_yes {
        Box::new(AcceptDefaults)
    } else {
        Box::new(InquirePrompter)
    };

    let (source_dir, defaults) = match &config.source_dir {
        Some(dir) => (dir.clone(), None),
        None => match resume_last_project(&store, prompter.as_mut())? {
            Some(resumed) => resumed,
            None => {
                info!("Run again with a source directory to create a new project.");
                return Ok(0);
            }
        },
    };

    validate_source(&source_dir)?;

    let mut overrides = config.overrides();
    if overrides.product_name.is_none() && defaults.is_none() {
        // New projects are named after their publish directory by default
        overrides.product_name = std::path::absolute(&source_dir)?
            .file_name()
            .map(|name| name.to_string_lossy().to_string());
    }

    let mut settings = collect_settings(defaults, prompter.as_mut(), &store, &overrides)?;
    settings.publish_dir = Some(std::path::absolute(&source_dir)?);

    if let Err(e) = store.save(&settings) {
        warn!("Error saving settings: {}", e);
    }

    info!("Scanning directory: {}", source_dir.display());
    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {wide_msg:.dim.white} {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress.set_prefix("Scanning");
    progress.enable_steady_tick(Duration::from_millis(100));

    let scanner = Scanner::new(&source_dir, Arc::new(progress.clone()));
    let scan = scanner.scan()?;
    progress.finish_and_clear();
    info!(
        "Found {} files in {} directories",
        scan.file_count(),
        scan.directory_count() + 1
    );

    let license_file = if settings.generate_license {
        match generate_license_rtf(&settings.manufacturer, &settings.product_name, &config.output_dir) {
            Ok(path) => {
                settings.license_file = path.to_string_lossy().to_string();
                Some(path)
            }
            Err(e) => {
                warn!("Error generating license file: {}", e);
                None
            }
        }
    } else {
        None
    };

    let mut report = ProjectGenerator::new(&config.output_dir).generate(&settings, &scan)?;
    report.license_file = license_file;

    Reporter::new(ReportFormat::ConsoleTable).print_report(&report);

    Ok(0)
}

/// Offer the last project's settings; `None` when the operator declines
fn resume_last_project(
    store: &SettingsStore,
    prompter: &mut dyn Prompter,
) -> Result<Option<(PathBuf, Option<Settings>)>> {
    let last = store.load(None).ok_or_else(|| {
        wixgen::error!(
            MissingSettings,
            "no previous project found, please provide a source directory"
        )
    })?;

    let name = if last.product_name.is_empty() {
        "Unknown"
    } else {
        last.product_name.as_str()
    };
    if !prompter.confirm(&format!("Use last project '{}'?", name), true)? {
        return Ok(None);
    }

    let source_dir = last.publish_dir.clone().ok_or_else(|| {
        wixgen::error!(
            MissingSettings,
            "the last project has no source directory saved, please provide one"
        )
    })?;

    Ok(Some((source_dir, Some(last))))
}
