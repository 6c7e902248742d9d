/*!
 * Writes the generated installer project to the output directory
 */

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::assembler::{Assembler, PackageTree};
use crate::error::{Result, ResultExt};
use crate::settings::Settings;
use crate::types::ScanResult;
use crate::writer::{write_atomic, WriteOutcome, XmlWriter};

/// Outcome of writing one artifact
#[derive(Debug)]
pub struct ArtifactStatus {
    /// Kind of artifact (`package`, `project`, ...)
    pub kind: &'static str,
    /// Intended path
    pub target: PathBuf,
    /// Write result; errors are kept as text since they are not fatal
    pub outcome: std::result::Result<WriteOutcome, String>,
}

/// Summary of a generation run
#[derive(Debug)]
pub struct GenerationReport {
    /// Output directory
    pub output_dir: PathBuf,
    /// One entry per artifact
    pub artifacts: Vec<ArtifactStatus>,
    /// Number of packaged files
    pub files: usize,
    /// Number of packaged directories below the root
    pub directories: usize,
    /// Total payload size in bytes
    pub total_size: u64,
    /// Name of the main executable, if any
    pub main_executable: Option<String>,
    /// Generated license, if any
    pub license_file: Option<PathBuf>,
}

impl GenerationReport {
    /// Whether every artifact landed at its intended path
    pub fn all_written(&self) -> bool {
        self.artifacts
            .iter()
            .all(|a| matches!(a.outcome, Ok(WriteOutcome::Written(_))))
    }
}

/// Generates `.wxs`, `.wixproj` and `README.md` for a product
pub struct ProjectGenerator {
    output_dir: PathBuf,
    writer: XmlWriter,
}

impl ProjectGenerator {
    /// Create a generator writing into `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            writer: XmlWriter::new(),
        }
    }

    /// Path of the package description for a product
    pub fn wxs_path(&self, settings: &Settings) -> PathBuf {
        self.output_dir.join(format!("{}.wxs", settings.product_name))
    }

    /// Path of the build project for a product
    pub fn wixproj_path(&self, settings: &Settings) -> PathBuf {
        self.output_dir.join(format!("{}.wixproj", settings.product_name))
    }

    /// Build the element trees and write every artifact
    ///
    /// Only failing to create the output directory is fatal; artifact write
    /// failures are logged and recorded in the report.
    pub fn generate(&self, settings: &Settings, scan: &ScanResult) -> Result<GenerationReport> {
        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("creating {}", self.output_dir.display()))?;

        let assembler = Assembler::new(settings);
        let package = assembler.build_package(scan);
        let project = assembler.build_project(&package);

        let mut artifacts = Vec::new();

        let wxs_path = self.wxs_path(settings);
        artifacts.push(self.status(
            "package",
            &wxs_path,
            self.writer.write(&package.root, &wxs_path),
        ));

        let wixproj_path = self.wixproj_path(settings);
        artifacts.push(self.status(
            "project",
            &wixproj_path,
            self.writer.write(&project, &wixproj_path),
        ));

        let readme_path = self.output_dir.join("README.md");
        artifacts.push(self.status(
            "readme",
            &readme_path,
            write_atomic(&readme_path, readme(settings, &package).as_bytes()),
        ));

        info!("WiX installer project created in {}", self.output_dir.display());

        let main_executable = package.main_executable.as_ref().and_then(|file_id| {
            package
                .root
                .find_by_id(file_id)
                .and_then(|file| file.get_attr("Name"))
                .map(str::to_string)
        });

        Ok(GenerationReport {
            output_dir: self.output_dir.clone(),
            artifacts,
            files: scan.file_count(),
            directories: scan.directory_count(),
            total_size: scan.total_size(),
            main_executable,
            license_file: None,
        })
    }

    fn status(
        &self,
        kind: &'static str,
        target: &Path,
        result: Result<WriteOutcome>,
    ) -> ArtifactStatus {
        let outcome = result.map_err(|e| {
            warn!("Error writing {}: {}", target.display(), e);
            e.to_string()
        });
        ArtifactStatus {
            kind,
            target: target.to_path_buf(),
            outcome,
        }
    }
}

/// Build instructions placed next to the generated project
fn readme(settings: &Settings, package: &PackageTree) -> String {
    let product = &settings.product_name;
    let mut extensions = String::from("-ext WixToolset.UI.wixext");
    if package.launches_application() {
        extensions.push_str(" -ext WixToolset.Util.wixext");
    }

    format!(
        r#"# {product} Installer Project

This directory contains a WiX installer project generated by wixgen.

## Prerequisites

- WiX Toolset v4 or later (https://wixtoolset.org/)
- .NET 6.0 SDK or later

## Building the Installer

### Option 1: dotnet build

From this directory run:

```
dotnet build {product}.wixproj
```

The installer (.msi) is written to the `bin` directory.

### Option 2: wix build

From this directory run:

```
wix build {extensions} {product}.wxs
```

## Customizing the Installer

`{product}.wxs` can be edited by hand. Re-running wixgen overwrites it.
See https://wixtoolset.org/docs/ for the schema reference.
"#
    )
}
