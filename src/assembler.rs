/*!
 * Assembly of the WiX package and build-project element trees
 *
 * Element and attribute names below are WiX v4 vocabulary and must be kept
 * verbatim for the generated project to build.
 */

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use uuid::Uuid;

use crate::element::Element;
use crate::ident::{self, INSTALL_DIR_ID};
use crate::settings::{Settings, UiLevel};
use crate::types::ScanResult;

/// Default WiX namespace
pub const WIX_NAMESPACE: &str = "http://wixtoolset.org/schemas/v4/wxs";
/// WiX UI extension namespace
pub const UI_NAMESPACE: &str = "http://wixtoolset.org/schemas/v4/wxs/ui";
/// SDK referenced by the generated `.wixproj`
pub const WIX_SDK: &str = "WixToolset.Sdk/6.0.0";
/// Version of the WiX extension packages
pub const EXTENSION_VERSION: &str = "6.0.0";

const COMPONENT_GROUP_ID: &str = "ProductComponents";
const SHORTCUT_FOLDER_ID: &str = "ShortcutFolder";
const EXECUTABLE_EXTENSION: &str = ".exe";

/// Result of assembling the package tree
#[derive(Debug, Clone)]
pub struct PackageTree {
    /// Root `Wix` element
    pub root: Element,
    /// File id of the main executable, if one was found
    pub main_executable: Option<String>,
    /// Number of file-carrying components
    pub file_components: usize,
    /// Directory ids generated for more than one distinct path
    pub id_collisions: Vec<String>,
}

impl PackageTree {
    /// Whether the launch-after-install custom action was emitted
    pub fn launches_application(&self) -> bool {
        self.root.find_by_id("LaunchApplication").is_some()
    }
}

/// Builds element trees from settings and scan results
pub struct Assembler<'a> {
    settings: &'a Settings,
}

impl<'a> Assembler<'a> {
    /// Create an assembler for a product
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Build the `.wxs` package description
    pub fn build_package(&self, scan: &ScanResult) -> PackageTree {
        let s = self.settings;
        let ui_active = s.ui_level.is_active();

        let mut package = Element::new("Package")
            .attr("Name", &s.product_name)
            .attr("Manufacturer", &s.manufacturer)
            .attr("Version", &s.product_version)
            .attr("UpgradeCode", &s.upgrade_code);
        if s.shortcut_all_users {
            package.set_attr("Scope", "perMachine");
        }

        package.push(Element::new("MediaTemplate").attr("EmbedCab", "yes"));

        if ui_active {
            self.add_user_interface(&mut package);
        }

        let (components, main_executable, file_components) = self.component_group(scan);
        package.push(components);

        package.push(
            Element::new("Feature")
                .attr("Id", "ProductFeature")
                .attr("Title", &s.product_name)
                .attr("Level", "1")
                .child(Element::new("ComponentGroupRef").attr("Id", COMPONENT_GROUP_ID)),
        );

        let (install_dir, id_collisions) = self.install_directory(scan);
        package.push(
            Element::new("StandardDirectory")
                .attr("Id", "ProgramFiles6432Folder")
                .child(
                    Element::new("Directory")
                        .attr("Id", "ManufacturerFolder")
                        .attr("Name", &s.manufacturer)
                        .child(install_dir),
                ),
        );

        package.push(Element::new("StandardDirectory").attr("Id", "DesktopFolder"));
        let program_menu = package.push(Element::new("StandardDirectory").attr("Id", "ProgramMenuFolder"));
        if self.uses_shortcut_folder() {
            program_menu.push(
                Element::new("Directory")
                    .attr("Id", SHORTCUT_FOLDER_ID)
                    .attr("Name", &s.shortcut_folder_name),
            );
        }

        if !s.icon_file.is_empty() {
            match resolve_resource(&s.icon_file) {
                Some(icon) => {
                    package.push(
                        Element::new("Icon")
                            .attr("Id", "ProductIcon")
                            .attr("SourceFile", icon.to_string_lossy()),
                    );
                    package.push(
                        Element::new("Property")
                            .attr("Id", "ARPPRODUCTICON")
                            .attr("Value", "ProductIcon"),
                    );
                }
                None => warn!(
                    "Icon file '{}' not found. Icon will not be included in the installer.",
                    s.icon_file
                ),
            }
        }

        if s.run_after_install {
            match &main_executable {
                Some(file_id) => self.add_launch_action(&mut package, file_id),
                None => warn!("No executable found, the application will not be launched after install"),
            }
        }

        let root = Element::new("Wix")
            .attr("xmlns", WIX_NAMESPACE)
            .attr("xmlns:ui", UI_NAMESPACE)
            .child(package);

        PackageTree {
            root,
            main_executable,
            file_components,
            id_collisions,
        }
    }

    /// Build the SDK-style `.wixproj` for a package
    pub fn build_project(&self, package: &PackageTree) -> Element {
        let s = self.settings;

        let mut extensions = Element::new("ItemGroup");
        let mut wanted = vec!["WixToolset.UI.wixext"];
        if package.launches_application() {
            wanted.push("WixToolset.Util.wixext");
        }
        for extension in wanted {
            extensions.push(Element::new("WixExtension").attr("Include", extension));
            extensions.push(
                Element::new("PackageReference")
                    .attr("Include", extension)
                    .attr("Version", EXTENSION_VERSION),
            );
        }

        Element::new("Project")
            .attr("Sdk", WIX_SDK)
            .child(
                Element::new("PropertyGroup")
                    .child(Element::new("OutputName").text(&s.product_name))
                    .child(Element::new("OutputType").text("Package"))
                    .child(Element::new("OutputPath").text("bin\\")),
            )
            .child(
                Element::new("ItemGroup").child(
                    Element::new("Compile").attr("Include", format!("{}.wxs", s.product_name)),
                ),
            )
            .child(extensions)
    }

    fn uses_shortcut_folder(&self) -> bool {
        self.settings.add_start_menu_shortcut && !self.settings.shortcut_folder_name.is_empty()
    }

    fn registry_key(&self) -> String {
        format!(
            "Software\\{}\\{}",
            self.settings.manufacturer, self.settings.product_name
        )
    }

    /// GUID that stays the same for a product across runs and versions
    fn stable_guid(&self, identity: &str) -> String {
        let upgrade_code = &self.settings.upgrade_code;
        let namespace = Uuid::parse_str(upgrade_code)
            .unwrap_or_else(|_| Uuid::new_v5(&Uuid::NAMESPACE_OID, upgrade_code.as_bytes()));
        Uuid::new_v5(&namespace, identity.as_bytes()).to_string()
    }

    /// Registry value serving as the key path of a component without files
    fn key_marker(&self, name: &str) -> Element {
        Element::new("RegistryValue")
            .attr("Root", "HKCU")
            .attr("Key", self.registry_key())
            .attr("Name", name)
            .attr("Type", "integer")
            .attr("Value", "1")
            .attr("KeyPath", "yes")
    }

    /// Component group with every file plus the optional shortcut and PATH
    /// components
    fn component_group(&self, scan: &ScanResult) -> (Element, Option<String>, usize) {
        let s = self.settings;
        let ui_active = s.ui_level.is_active();
        let mut group = Element::new("ComponentGroup").attr("Id", COMPONENT_GROUP_ID);

        if self.uses_shortcut_folder() {
            group.push(
                Element::new("Component")
                    .attr("Id", "ShortcutFolderComponent")
                    .attr("Directory", SHORTCUT_FOLDER_ID)
                    .attr("Guid", self.stable_guid("ShortcutFolderComponent"))
                    .child(self.key_marker("installed_shortcut_folder"))
                    .child(
                        Element::new("RemoveFolder")
                            .attr("Id", "RemoveShortcutFolder")
                            .attr("On", "uninstall"),
                    ),
            );
        }

        let mut main_executable: Option<String> = None;
        let mut counter = 0;

        for (rel_dir, file) in scan.iter_files() {
            counter += 1;
            let component_id = format!("Component_{}", counter);
            let file_id = format!("File_{}", counter);

            let is_main = main_executable.is_none() && is_executable(&file.name);
            let guid = if is_main {
                let identity = ident::path_segments(&rel_dir.join(&file.name)).join("/");
                self.stable_guid(&format!("file:{}", identity))
            } else {
                "*".to_string()
            };

            let mut file_el = Element::new("File")
                .attr("Id", &file_id)
                .attr("Source", file.path.to_string_lossy())
                .attr("Name", &file.name);
            if is_main {
                file_el.set_attr("KeyPath", "yes");
            }

            let mut component = Element::new("Component")
                .attr("Id", component_id)
                .attr("Directory", ident::directory_id_for(rel_dir))
                .attr("Guid", guid)
                .child(file_el);

            if is_main {
                debug!("Main executable: {} ({})", file.name, file_id);
                for extension in s.extensions() {
                    component.push(self.file_association(&extension, &file_id));
                }
                main_executable = Some(file_id);
            }

            group.push(component);
        }

        match &main_executable {
            Some(file_id) => {
                if s.add_desktop_shortcut {
                    let mut component = self.shortcut_component(
                        "DesktopShortcut",
                        "DesktopFolder",
                        file_id,
                        "DesktopShortcutInstalled",
                    );
                    if ui_active {
                        component.set_attr("Condition", "INSTALLDESKTOPSHORTCUT=1");
                    }
                    group.push(component);
                }
                if s.add_start_menu_shortcut {
                    let directory = if self.uses_shortcut_folder() {
                        SHORTCUT_FOLDER_ID
                    } else {
                        "ProgramMenuFolder"
                    };
                    let mut component = self.shortcut_component(
                        "StartMenuShortcut",
                        directory,
                        file_id,
                        "StartMenuShortcutInstalled",
                    );
                    if ui_active {
                        component.set_attr("Condition", "INSTALLSTARTMENUSHORTCUT=1");
                    }
                    group.push(component);
                }
            }
            None if s.add_desktop_shortcut || s.add_start_menu_shortcut => {
                warn!("No executable found in the source directory, shortcuts will not be created");
            }
            None => {}
        }

        if s.add_to_path {
            let mut component = Element::new("Component")
                .attr("Id", "EnvironmentPathComponent")
                .attr("Directory", INSTALL_DIR_ID)
                .attr("Guid", self.stable_guid("EnvironmentPathComponent"))
                .child(
                    Element::new("Environment")
                        .attr("Id", "EnvironmentPath")
                        .attr("Name", "PATH")
                        .attr("Value", "[INSTALLDIR]")
                        .attr("Permanent", "no")
                        .attr("Part", "last")
                        .attr("Action", "set")
                        .attr("System", "yes"),
                )
                .child(
                    Element::new("RegistryValue")
                        .attr("Root", "HKLM")
                        .attr(
                            "Key",
                            "SYSTEM\\CurrentControlSet\\Control\\Session Manager\\Environment",
                        )
                        .attr("Name", format!("Path_{}", s.product_name))
                        .attr("Type", "string")
                        .attr("Value", "[INSTALLDIR]")
                        .attr("KeyPath", "yes"),
                );
            if ui_active {
                component.set_attr("Condition", "ADDTOPATH=1");
            }
            group.push(component);
        }

        (group, main_executable, counter)
    }

    fn shortcut_component(
        &self,
        shortcut_id: &str,
        directory: &str,
        target_file_id: &str,
        marker_name: &str,
    ) -> Element {
        let component_id = format!("{}Component", shortcut_id);
        Element::new("Component")
            .attr("Id", &component_id)
            .attr("Directory", directory)
            .attr("Guid", self.stable_guid(&component_id))
            .child(
                Element::new("Shortcut")
                    .attr("Id", shortcut_id)
                    .attr("Name", &self.settings.product_name)
                    .attr("Target", format!("[#{}]", target_file_id))
                    .attr("WorkingDirectory", INSTALL_DIR_ID)
                    .attr("IconIndex", "0"),
            )
            .child(self.key_marker(marker_name))
    }

    fn file_association(&self, extension: &str, file_id: &str) -> Element {
        let product = &self.settings.product_name;
        let ext_id = ident::extension_id(extension);
        Element::new("ProgId")
            .attr("Id", format!("{}{}", ident::sanitize_identifier(product), ext_id))
            .attr("Description", format!("{} File", product))
            .attr("Icon", file_id)
            .child(
                Element::new("Extension")
                    .attr("Id", ext_id)
                    .attr("ContentType", "application/octet-stream"),
            )
    }

    /// `INSTALLDIR` with one nested `Directory` per scanned path segment
    fn install_directory(&self, scan: &ScanResult) -> (Element, Vec<String>) {
        let mut tree = DirNode::default();
        for rel_dir in scan.directories.keys() {
            let mut node = &mut tree;
            for segment in ident::path_segments(rel_dir) {
                node = node.children.entry(segment).or_default();
            }
        }

        let mut seen: HashMap<String, String> = HashMap::new();
        let mut collisions = Vec::new();
        let mut install_dir = Element::new("Directory")
            .attr("Id", INSTALL_DIR_ID)
            .attr("Name", self.settings.install_dir());
        for (name, child) in &tree.children {
            install_dir.push(child.to_element(name, Path::new(""), &mut seen, &mut collisions));
        }

        (install_dir, collisions)
    }

    fn add_user_interface(&self, package: &mut Element) {
        let s = self.settings;
        let flag = |on: bool| if on { "1" } else { "0" };

        package.push(
            Element::new("Property")
                .attr("Id", "WIXUI_INSTALLDIR")
                .attr("Value", INSTALL_DIR_ID),
        );
        let dialog_set = match s.ui_level {
            UiLevel::Full => "WixUI_InstallDir",
            _ => "WixUI_Minimal",
        };
        package.push(Element::new("ui:WixUI").attr("Id", dialog_set));

        for (id, on) in [
            ("INSTALLDESKTOPSHORTCUT", s.add_desktop_shortcut),
            ("INSTALLSTARTMENUSHORTCUT", s.add_start_menu_shortcut),
            ("LAUNCHAPPONEXIT", s.run_after_install),
            ("ADDTOPATH", s.add_to_path),
        ] {
            package.push(Element::new("Property").attr("Id", id).attr("Value", flag(on)));
        }

        for (variable, path, what) in [
            ("WixUILicenseRtf", &s.license_file, "License file"),
            ("WixUIBannerBmp", &s.banner_image, "Banner image"),
            ("WixUIDialogBmp", &s.dialog_image, "Dialog image"),
        ] {
            if path.is_empty() {
                continue;
            }
            match resolve_resource(path) {
                Some(resolved) => {
                    package.push(
                        Element::new("WixVariable")
                            .attr("Id", variable)
                            .attr("Value", resolved.to_string_lossy()),
                    );
                }
                None => warn!("{} '{}' not found and will not be used", what, path),
            }
        }

        if s.ui_level == UiLevel::Full {
            package.push(install_options_ui());
        }
    }

    fn add_launch_action(&self, package: &mut Element, file_id: &str) {
        let condition = if self.settings.ui_level.is_active() {
            "NOT Installed AND LAUNCHAPPONEXIT=1"
        } else {
            "NOT Installed"
        };

        package.push(
            Element::new("Property")
                .attr("Id", "WixShellExecTarget")
                .attr("Value", format!("[#{}]", file_id)),
        );
        package.push(
            Element::new("CustomAction")
                .attr("Id", "LaunchApplication")
                .attr("BinaryRef", "Wix4UtilCA_$(sys.BUILDARCHSHORT)")
                .attr("DllEntry", "WixShellExec")
                .attr("Impersonate", "yes"),
        );
        package.push(
            Element::new("InstallExecuteSequence").child(
                Element::new("Custom")
                    .attr("Action", "LaunchApplication")
                    .attr("After", "InstallFinalize")
                    .attr("Condition", condition),
            ),
        );
    }
}

/// Intermediate directory tree, children sorted by raw segment name
#[derive(Default)]
struct DirNode {
    children: BTreeMap<String, DirNode>,
}

impl DirNode {
    fn to_element(
        &self,
        name: &str,
        parent: &Path,
        seen: &mut HashMap<String, String>,
        collisions: &mut Vec<String>,
    ) -> Element {
        let path = parent.join(name);
        let id = ident::directory_id(name);
        let display = ident::path_segments(&path).join("/");

        match seen.get(&id) {
            Some(other) if *other != display => {
                warn!(
                    "Directories '{}' and '{}' both map to id '{}'",
                    other, display, id
                );
                collisions.push(id.clone());
            }
            Some(_) => {}
            None => {
                seen.insert(id.clone(), display);
            }
        }

        let mut element = Element::new("Directory").attr("Id", id).attr("Name", name);
        for (child_name, child) in &self.children {
            element.push(child.to_element(child_name, &path, seen, collisions));
        }
        element
    }
}

/// Full dialog subtree inserting an installation options page between the
/// license and install directory dialogs
fn install_options_ui() -> Element {
    let checkbox = |id: &str, y: &str, property: &str, text: &str| {
        Element::new("Control")
            .attr("Id", id)
            .attr("Type", "CheckBox")
            .attr("X", "20")
            .attr("Y", y)
            .attr("Width", "330")
            .attr("Height", "17")
            .attr("Property", property)
            .attr("CheckBoxValue", "1")
            .attr("Text", text)
    };
    let button = |id: &str, x: &str, text: &str| {
        Element::new("Control")
            .attr("Id", id)
            .attr("Type", "PushButton")
            .attr("X", x)
            .attr("Y", "243")
            .attr("Width", "56")
            .attr("Height", "17")
            .attr("Text", text)
    };
    let publish = |dialog: &str, control: &str, event: &str, value: &str| {
        Element::new("Publish")
            .attr("Dialog", dialog)
            .attr("Control", control)
            .attr("Event", event)
            .attr("Value", value)
    };

    let dialog = Element::new("Dialog")
        .attr("Id", "InstallOptionsDialog")
        .attr("Width", "370")
        .attr("Height", "270")
        .attr("Title", "Installation Options")
        .child(checkbox(
            "DesktopShortcutCheckbox",
            "60",
            "INSTALLDESKTOPSHORTCUT",
            "Create a shortcut on the desktop",
        ))
        .child(checkbox(
            "StartMenuShortcutCheckbox",
            "80",
            "INSTALLSTARTMENUSHORTCUT",
            "Create a shortcut in the Start Menu",
        ))
        .child(checkbox(
            "AddToPathCheckbox",
            "100",
            "ADDTOPATH",
            "Add application directory to PATH",
        ))
        .child(checkbox(
            "LaunchAppCheckbox",
            "120",
            "LAUNCHAPPONEXIT",
            "Launch application after installation",
        ))
        .child(button("Back", "180", "Back"))
        .child(button("Next", "236", "Next").attr("Default", "yes"))
        .child(button("Cancel", "304", "Cancel").attr("Cancel", "yes"));

    Element::new("UI")
        .child(dialog)
        .child(publish("InstallOptionsDialog", "Back", "NewDialog", "LicenseAgreementDlg"))
        .child(publish("InstallOptionsDialog", "Next", "NewDialog", "InstallDirDlg"))
        .child(publish("InstallOptionsDialog", "Cancel", "SpawnDialog", "CancelDlg"))
        .child(publish("LicenseAgreementDlg", "Next", "NewDialog", "InstallOptionsDialog").attr("Order", "2"))
        .child(publish("InstallDirDlg", "Back", "NewDialog", "InstallOptionsDialog").attr("Order", "2"))
}

fn is_executable(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(EXECUTABLE_EXTENSION)
}

/// Resolve a user-supplied resource path to an absolute path
///
/// Relative paths whose exact spelling does not exist are matched
/// case-insensitively against the entries of their directory.
pub fn resolve_resource(raw: &str) -> Option<PathBuf> {
    let found = find_resource(raw)?;
    Some(std::path::absolute(&found).unwrap_or(found))
}

fn find_resource(raw: &str) -> Option<PathBuf> {
    let path = PathBuf::from(raw);
    if path.exists() {
        return Some(path);
    }
    if path.is_absolute() {
        return None;
    }

    let file_name = path.file_name()?.to_string_lossy().to_lowercase();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    fs::read_dir(&dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .find(|entry| entry.file_name().to_string_lossy().to_lowercase() == file_name)
        .map(|entry| dir.join(entry.file_name()))
}
