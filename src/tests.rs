/*!
 * End-to-end tests for wixgen: scan, assemble, render, write
 */

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::ProgressBar;
use quick_xml::events::Event;
use quick_xml::Reader;
use tempfile::tempdir;

use crate::assembler::Assembler;
use crate::error::Result;
use crate::project::ProjectGenerator;
use crate::scanner::Scanner;
use crate::settings::{Settings, UiLevel};
use crate::writer::WriteOutcome;

// Helper function to create a file with `size` bytes
fn create_file(path: &Path, size: usize) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(&vec![b'x'; size])?;
    Ok(())
}

// Publish directory with App.exe (10 bytes) and data/readme.txt (5 bytes)
fn setup_publish_directory() -> io::Result<tempfile::TempDir> {
    let temp_dir = tempdir()?;
    create_file(&temp_dir.path().join("App.exe"), 10)?;
    create_file(&temp_dir.path().join("data").join("readme.txt"), 5)?;
    Ok(temp_dir)
}

fn minimal_settings() -> Settings {
    let mut settings = Settings {
        product_name: "App".to_string(),
        product_version: "1.0.0".to_string(),
        manufacturer: "Acme".to_string(),
        ui_level: UiLevel::Minimal,
        generate_license: false,
        add_desktop_shortcut: false,
        add_start_menu_shortcut: false,
        add_to_path: false,
        ..Default::default()
    };
    settings.ensure_identifiers();
    settings
}

fn scanner(root: &Path) -> Scanner {
    Scanner::new(root, Arc::new(ProgressBar::hidden()))
}

// Count start/empty elements by local name in rendered XML
fn count_elements(xml: &str, name: &str) -> usize {
    let mut reader = Reader::from_str(xml);
    let mut count = 0;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == name.as_bytes() => {
                count += 1
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => panic!("invalid XML at {}: {}", reader.buffer_position(), e),
        }
    }
    count
}

#[test]
fn test_scan_root_and_subdirectory() -> Result<()> {
    let temp_dir = tempdir()?;
    create_file(&temp_dir.path().join("root.bin"), 3)?;
    create_file(&temp_dir.path().join("sub").join("inner.bin"), 7)?;

    let scan = scanner(temp_dir.path()).scan()?;

    assert_eq!(scan.directories.len(), 2);
    let root_files = scan.files_in("");
    assert_eq!(root_files.len(), 1);
    assert_eq!(root_files[0].name, "root.bin");
    assert_eq!(root_files[0].size, 3);
    assert!(root_files[0].path.is_absolute());

    let sub_files = scan.files_in("sub");
    assert_eq!(sub_files.len(), 1);
    assert_eq!(sub_files[0].name, "inner.bin");
    assert_eq!(sub_files[0].size, 7);

    Ok(())
}

#[test]
fn test_scan_keeps_empty_directories() -> Result<()> {
    let temp_dir = tempdir()?;
    fs::create_dir_all(temp_dir.path().join("empty").join("deeper"))?;

    let scan = scanner(temp_dir.path()).scan()?;

    assert!(scan.directories.contains_key(Path::new("empty")));
    assert!(scan.directories.contains_key(&PathBuf::from("empty").join("deeper")));
    assert_eq!(scan.file_count(), 0);
    Ok(())
}

#[test]
fn test_every_file_appears_once() -> Result<()> {
    let temp_dir = tempdir()?;
    for path in ["a.txt", "b/c.txt", "b/d/e.txt", "b/d/f.txt"] {
        create_file(&temp_dir.path().join(path), 1)?;
    }

    let scan = scanner(temp_dir.path()).scan()?;

    let mut names: Vec<_> = scan.iter_files().map(|(_, f)| f.name.clone()).collect();
    names.sort();
    assert_eq!(names, vec!["a.txt", "c.txt", "e.txt", "f.txt"]);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_scan_packages_symlinked_files() -> Result<()> {
    let outside = tempdir()?;
    let target = outside.path().join("target.dll");
    create_file(&target, 6)?;
    fs::create_dir_all(outside.path().join("linked_dir"))?;
    create_file(&outside.path().join("linked_dir").join("hidden.dll"), 2)?;

    let temp_dir = tempdir()?;
    create_file(&temp_dir.path().join("real.dll"), 3)?;
    std::os::unix::fs::symlink(&target, temp_dir.path().join("link.dll"))?;
    std::os::unix::fs::symlink(outside.path().join("missing.dll"), temp_dir.path().join("broken.dll"))?;
    std::os::unix::fs::symlink(outside.path().join("linked_dir"), temp_dir.path().join("plugins"))?;

    let scan = scanner(temp_dir.path()).scan()?;

    let root_files = scan.files_in("");
    let names: Vec<_> = root_files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["link.dll", "real.dll"]);
    assert_eq!(root_files[0].size, 6);
    assert_eq!(root_files[0].path, temp_dir.path().join("link.dll"));
    // Linked directories are not descended into
    assert_eq!(scan.file_count(), 2);
    Ok(())
}

#[test]
fn test_scan_rejects_missing_or_file_root() -> Result<()> {
    let temp_dir = tempdir()?;
    let missing = temp_dir.path().join("missing");
    assert!(scanner(&missing).scan().unwrap_err().is_usage_error());

    let file = temp_dir.path().join("file.txt");
    create_file(&file, 1)?;
    assert!(scanner(&file).scan().is_err());
    Ok(())
}

#[test]
fn test_end_to_end_minimal_project() -> Result<()> {
    let publish = setup_publish_directory()?;
    let output = tempdir()?;
    let settings = minimal_settings();

    let scan = scanner(publish.path()).scan()?;
    let report = ProjectGenerator::new(output.path()).generate(&settings, &scan)?;

    assert!(report.all_written());
    assert_eq!(report.files, 2);
    assert_eq!(report.total_size, 15);
    assert_eq!(report.main_executable.as_deref(), Some("App.exe"));

    let wxs = fs::read_to_string(output.path().join("App.wxs"))?;
    assert_eq!(count_elements(&wxs, "File"), 2);
    assert_eq!(count_elements(&wxs, "Shortcut"), 0);
    assert_eq!(count_elements(&wxs, "Environment"), 0);
    assert!(wxs.contains(r#"<Directory Id="Dir_data" Name="data"/>"#));
    assert!(wxs.contains(r#"<ui:WixUI Id="WixUI_Minimal"/>"#));
    assert!(wxs.contains(r#"Directory="Dir_data""#));

    let wixproj = fs::read_to_string(output.path().join("App.wixproj"))?;
    assert!(wixproj.contains(r#"<Compile Include="App.wxs"/>"#));
    assert!(wixproj.contains("<OutputType>Package</OutputType>"));

    let readme = fs::read_to_string(output.path().join("README.md"))?;
    assert!(readme.contains("App.wxs"));

    Ok(())
}

#[test]
fn test_desktop_shortcut_toggles_marker() -> Result<()> {
    let temp_dir = tempdir()?;
    create_file(&temp_dir.path().join("tool.exe"), 4)?;
    let scan = scanner(temp_dir.path()).scan()?;

    let mut settings = minimal_settings();
    settings.add_desktop_shortcut = true;
    let tree = Assembler::new(&settings).build_package(&scan);

    let with_shortcut: Vec<_> = tree
        .root
        .descendants("Component")
        .into_iter()
        .filter(|c| c.children_named("Shortcut").next().is_some())
        .collect();
    assert_eq!(with_shortcut.len(), 1);
    assert_eq!(tree.root.descendants("RegistryValue").len(), 1);
    assert_eq!(
        with_shortcut[0].children_named("Shortcut").next().unwrap().get_attr("Target"),
        Some("[#File_1]")
    );

    settings.add_desktop_shortcut = false;
    let tree = Assembler::new(&settings).build_package(&scan);
    assert!(tree.root.descendants("Shortcut").is_empty());
    assert!(tree.root.descendants("RegistryValue").is_empty());

    Ok(())
}

#[test]
fn test_regeneration_is_stable() -> Result<()> {
    let publish = setup_publish_directory()?;
    let output = tempdir()?;
    let mut settings = minimal_settings();
    settings.add_desktop_shortcut = true;

    let scan = scanner(publish.path()).scan()?;
    let generator = ProjectGenerator::new(output.path());
    generator.generate(&settings, &scan)?;
    let first = fs::read_to_string(output.path().join("App.wxs"))?;
    generator.generate(&settings, &scan)?;
    let second = fs::read_to_string(output.path().join("App.wxs"))?;

    assert_eq!(first, second);
    assert!(!output.path().join("App.wxs.tmp").exists());
    Ok(())
}

#[test]
fn test_full_ui_with_license_and_icon() -> Result<()> {
    let publish = setup_publish_directory()?;
    let resources = tempdir()?;
    let license = resources.path().join("license.rtf");
    let icon = resources.path().join("App.ico");
    create_file(&license, 8)?;
    create_file(&icon, 8)?;

    let mut settings = minimal_settings();
    settings.ui_level = UiLevel::Full;
    settings.license_file = license.to_string_lossy().to_string();
    settings.icon_file = icon.to_string_lossy().to_string();
    settings.run_after_install = true;

    let scan = scanner(publish.path()).scan()?;
    let tree = Assembler::new(&settings).build_package(&scan);
    let xml = crate::writer::XmlWriter::new().render(&tree.root)?;

    assert_eq!(count_elements(&xml, "Dialog"), 1);
    assert_eq!(count_elements(&xml, "Icon"), 1);
    assert!(xml.contains(r#"<WixVariable Id="WixUILicenseRtf""#));
    assert!(xml.contains(r#"Condition="NOT Installed AND LAUNCHAPPONEXIT=1""#));
    Ok(())
}

#[test]
fn test_artifact_left_at_temp_path() -> Result<()> {
    let publish = setup_publish_directory()?;
    let output = tempdir()?;
    let settings = minimal_settings();
    // A directory where the .wxs should go cannot be removed as a file
    fs::create_dir_all(output.path().join("App.wxs").join("blocker"))?;

    let scan = scanner(publish.path()).scan()?;
    let report = ProjectGenerator::new(output.path()).generate(&settings, &scan)?;

    assert!(!report.all_written());
    let package = &report.artifacts[0];
    assert!(matches!(package.outcome, Ok(WriteOutcome::LeftAtTemp { .. })));
    assert!(output.path().join("App.wxs.tmp").exists());
    assert!(output.path().join("App.wixproj").exists());
    Ok(())
}
