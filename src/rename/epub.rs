//! EPUB metadata reader.
//!
//! An EPUB is a zip container. `META-INF/container.xml` names the package
//! document (OPF), whose `<metadata>` block carries Dublin Core elements.
//! Only the first `dc:title` and `dc:date` are read.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use roxmltree::{Document, Node, ParsingOptions};
use zip::ZipArchive;

use super::{BookMetadata, MetadataSource, RenameError};

const CONTAINER_PATH: &str = "META-INF/container.xml";
const DUBLIN_CORE_NS: &str = "http://purl.org/dc/elements/1.1/";

/// [`MetadataSource`] for EPUB containers.
#[derive(Debug, Clone, Copy, Default)]
pub struct EpubMetadata;

impl MetadataSource for EpubMetadata {
    fn read(&self, path: &Path) -> Result<BookMetadata, RenameError> {
        let file = File::open(path).map_err(|e| RenameError::metadata(path, &e))?;
        let mut archive = ZipArchive::new(file).map_err(|e| RenameError::metadata(path, &e))?;

        let container = read_entry(&mut archive, CONTAINER_PATH)
            .map_err(|e| RenameError::metadata(path, &e))?;
        let opf_path = rootfile_path(&container)
            .map_err(|e| RenameError::metadata(path, &format!("{CONTAINER_PATH}: {e}")))?
            .ok_or_else(|| RenameError::metadata(path, &"container.xml names no rootfile"))?;
        let opf =
            read_entry(&mut archive, &opf_path).map_err(|e| RenameError::metadata(path, &e))?;

        parse_opf(&opf).map_err(|e| RenameError::metadata(path, &format!("{opf_path}: {e}")))
    }
}

fn read_entry<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<String, String> {
    let mut entry = archive
        .by_name(name)
        .map_err(|e| format!("{name}: {e}"))?;
    let mut content = String::new();
    entry
        .read_to_string(&mut content)
        .map_err(|e| format!("{name}: {e}"))?;
    Ok(content)
}

fn parse_xml(text: &str) -> Result<Document<'_>, roxmltree::Error> {
    // Some packages still carry a DOCTYPE
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(text, options)
}

/// Package document path from `container.xml`.
fn rootfile_path(container: &str) -> Result<Option<String>, roxmltree::Error> {
    let doc = parse_xml(container)?;
    Ok(doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "rootfile")
        .find_map(|n| n.attribute("full-path"))
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty()))
}

/// Extract the first Dublin Core title and date from an OPF document.
fn parse_opf(opf: &str) -> Result<BookMetadata, roxmltree::Error> {
    let doc = parse_xml(opf)?;
    Ok(BookMetadata {
        title: first_dc_text(&doc, "title"),
        date: first_dc_text(&doc, "date"),
    })
}

fn first_dc_text(doc: &Document<'_>, name: &str) -> Option<String> {
    doc.descendants()
        .find(|n| {
            n.is_element()
                && n.tag_name().name() == name
                && n.tag_name().namespace() == Some(DUBLIN_CORE_NS)
        })
        .map(element_text)
        .filter(|s| !s.is_empty())
}

/// Character data of an element and its children, CDATA included.
fn element_text(node: Node<'_, '_>) -> String {
    let text: String = node
        .descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect();
    text.trim().to_string()
}
