/*!
 * XML writer implementation for wixgen
 */

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::warn;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::element::Element;
use crate::error;
use crate::error::{Result, ResultExt};

/// Where a written artifact ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Content is at the target path
    Written(PathBuf),
    /// The target could not be replaced; content is at the temporary path
    LeftAtTemp {
        /// Intended path
        target: PathBuf,
        /// Path holding the new content
        temp: PathBuf,
    },
}

impl WriteOutcome {
    /// Path holding the new content
    pub fn path(&self) -> &Path {
        match self {
            Self::Written(path) => path,
            Self::LeftAtTemp { temp, .. } => temp,
        }
    }
}

/// Renders element trees as indented XML
pub struct XmlWriter {
    /// Indentation width in spaces
    indent: usize,
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self { indent: 2 }
    }
}

impl XmlWriter {
    /// Create a new XML writer with two-space indentation
    pub fn new() -> Self {
        Self::default()
    }

    /// Render a tree, with XML declaration and trailing newline
    pub fn render(&self, root: &Element) -> Result<String> {
        let mut xml_writer = Writer::new_with_indent(Vec::new(), b' ', self.indent);

        xml_writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        self.write_element(root, &mut xml_writer)?;

        let mut bytes = xml_writer.into_inner();
        bytes.push(b'\n');
        String::from_utf8(bytes).with_context(|| "rendered XML is not UTF-8")
    }

    /// Render a tree and write it to a path atomically
    pub fn write(&self, root: &Element, path: &Path) -> Result<WriteOutcome> {
        let xml = self.render(root)?;
        write_atomic(path, xml.as_bytes())
    }

    fn write_element<W: Write>(&self, element: &Element, writer: &mut Writer<W>) -> Result<()> {
        let mut start_tag = BytesStart::new(element.name.as_str());
        for (key, value) in &element.attributes {
            start_tag.push_attribute((key.as_str(), value.as_str()));
        }

        if element.children.is_empty() && element.text.is_none() {
            writer.write_event(Event::Empty(start_tag))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start_tag))?;
        if let Some(text) = &element.text {
            writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        for child in &element.children {
            self.write_element(child, writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;

        Ok(())
    }
}

/// Sibling temporary path used while writing `path`
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write through a temporary file, then rename over the target
///
/// If an existing target cannot be removed (e.g. it is open in another
/// program) the new content stays at the temporary path.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<WriteOutcome> {
    let temp = temp_path(path);
    fs::write(&temp, contents)
        .map_err(|e| error!(Writer, "writing {}: {}", temp.display(), e))?;

    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            warn!(
                "Could not overwrite {} ({}). The new file has been saved as {}",
                path.display(),
                e,
                temp.display()
            );
            return Ok(WriteOutcome::LeftAtTemp {
                target: path.to_path_buf(),
                temp,
            });
        }
    }

    fs::rename(&temp, path)
        .map_err(|e| error!(Writer, "renaming {} to {}: {}", temp.display(), path.display(), e))?;
    Ok(WriteOutcome::Written(path.to_path_buf()))
}
