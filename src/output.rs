//! JSON snapshots of a document's TOC structure and content tree.
//!
//! Every write replaces the whole file. Output is UTF-8, indented with two
//! spaces, and keeps non-ASCII characters unescaped.

use crate::content::ContentTree;
use crate::error::Result;
use crate::toc::TocStructure;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Where one document's output files go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// TOC structure file (`toc_{id}.json`)
    pub toc: PathBuf,
    /// Content tree file (`content_{id}.json`)
    pub content: PathBuf,
}

impl OutputPaths {
    /// Output paths for document `id` inside `dir`.
    pub fn for_document(dir: impl AsRef<Path>, id: &str) -> Self {
        let dir = dir.as_ref();
        Self {
            toc: dir.join(format!("toc_{}.json", id)),
            content: dir.join(format!("content_{}.json", id)),
        }
    }
}

/// Write `value` as pretty JSON, replacing any existing file.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

/// Read a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Write the TOC structure snapshot.
pub fn write_toc(path: &Path, toc: &TocStructure) -> Result<()> {
    write_json(path, toc)
}

/// Read a TOC structure snapshot.
pub fn read_toc(path: &Path) -> Result<TocStructure> {
    read_json(path)
}

/// Write the content tree snapshot.
pub fn write_content(path: &Path, content: &ContentTree) -> Result<()> {
    write_json(path, content)
}

/// Read a content tree snapshot.
pub fn read_content(path: &Path) -> Result<ContentTree> {
    read_json(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_paths_for_document() {
        let paths = OutputPaths::for_document("/out", "report-7");
        assert_eq!(paths.toc, PathBuf::from("/out/toc_report-7.json"));
        assert_eq!(paths.content, PathBuf::from("/out/content_report-7.json"));
    }

    #[test]
    fn test_non_ascii_is_not_escaped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("toc.json");
        let mut toc = TocStructure::new();
        toc.open_section("SECTION Übersicht");
        toc.push_chapter("SECTION Übersicht", "Größen");
        write_toc(&path, &toc).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("Übersicht"));
        assert!(raw.contains("Größen"));
        assert!(raw.contains("\n  \"SECTION"));
    }

    #[test]
    fn test_write_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("toc.json");

        let mut first = TocStructure::new();
        first.open_section("SECTION 1");
        first.open_section("SECTION 2");
        write_toc(&path, &first).unwrap();

        let mut second = TocStructure::new();
        second.open_section("SECTION 3");
        write_toc(&path, &second).unwrap();

        assert_eq!(read_toc(&path).unwrap(), second);
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = read_content(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, crate::error::Error::Io(_)));
    }
}
