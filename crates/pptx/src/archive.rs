//! In-memory PPTX archive with raw pass-through of untouched parts.

use regex::Regex;
use restyle_core::{Error, Result};
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::sync::LazyLock;
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

/// Slide parts live at `ppt/slides/slideN.xml`.
static SLIDE_PART_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").unwrap());

/// A slide entry located in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlidePart {
    /// Part name inside the container.
    pub name: String,

    /// 1-based slide number parsed from the part name.
    pub number: usize,
}

/// One archive entry, decompressed.
#[derive(Debug)]
struct Part {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    last_modified: DateTime,
    unix_mode: Option<u32>,
    modified: bool,
}

/// A presentation container held in memory.
///
/// Parts keep their entry order. Only parts changed through [`Archive::write_text`]
/// are re-encoded on [`Archive::serialize`]; every other entry has its
/// compressed stream copied verbatim.
pub struct Archive {
    source: Vec<u8>,
    parts: Vec<Part>,
    index: HashMap<String, usize>,
}

impl Archive {
    /// Open an archive from its raw bytes.
    ///
    /// Every entry is decompressed up front, so a bad checksum or a broken
    /// deflate stream is reported here rather than at write time.
    pub fn open(bytes: Vec<u8>) -> Result<Self> {
        let mut zip = ZipArchive::new(Cursor::new(bytes.as_slice()))
            .map_err(|e| Error::CorruptArchive(format!("Failed to open ZIP: {}", e)))?;

        let mut parts = Vec::with_capacity(zip.len());
        let mut index = HashMap::with_capacity(zip.len());

        for i in 0..zip.len() {
            let mut file = zip
                .by_index(i)
                .map_err(|e| Error::CorruptArchive(format!("Failed to read entry {}: {}", i, e)))?;

            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)
                .map_err(|e| Error::CorruptArchive(format!("Failed to read '{}': {}", name, e)))?;

            index.entry(name.clone()).or_insert(parts.len());
            parts.push(Part {
                name,
                data,
                compression: file.compression(),
                last_modified: file.last_modified(),
                unix_mode: file.unix_mode(),
                modified: false,
            });
        }
        drop(zip);

        log::debug!("Opened archive with {} parts", parts.len());

        Ok(Self {
            source: bytes,
            parts,
            index,
        })
    }

    /// All part names in entry order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    /// Part names matching `pattern`, in entry order.
    pub fn list_parts(&self, pattern: &Regex) -> Vec<String> {
        self.part_names()
            .filter(|name| pattern.is_match(name))
            .map(str::to_string)
            .collect()
    }

    /// Slide parts sorted by ascending slide number, not entry order.
    pub fn slide_parts(&self) -> Vec<SlidePart> {
        let mut slides: Vec<SlidePart> = self
            .part_names()
            .filter_map(|name| {
                let caps = SLIDE_PART_REGEX.captures(name)?;
                let number = caps[1].parse().ok()?;
                Some(SlidePart {
                    name: name.to_string(),
                    number,
                })
            })
            .collect();

        slides.sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.name.cmp(&b.name)));
        slides
    }

    /// Whether a part exists.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Raw (decompressed) bytes of a part.
    pub fn read_bytes(&self, name: &str) -> Result<&[u8]> {
        self.part(name).map(|p| p.data.as_slice())
    }

    /// A part decoded as UTF-8 text.
    pub fn read_text(&self, name: &str) -> Result<String> {
        let part = self.part(name)?;
        String::from_utf8(part.data.clone())
            .map_err(|_| Error::InvalidPartEncoding(name.to_string()))
    }

    /// A part decoded as UTF-8, with invalid sequences replaced by U+FFFD.
    pub fn read_text_lossy(&self, name: &str) -> Result<String> {
        let part = self.part(name)?;
        let text = String::from_utf8_lossy(&part.data);
        if let Cow::Owned(_) = text {
            log::warn!("Part '{}' is not valid UTF-8, decoding lossily", name);
        }
        Ok(text.into_owned())
    }

    /// Replace a part's content with new text.
    ///
    /// Writing the content a part already has leaves it untouched.
    pub fn write_text(&mut self, name: &str, content: &str) -> Result<()> {
        let idx = *self
            .index
            .get(name)
            .ok_or_else(|| Error::MissingPart(name.to_string()))?;
        let part = &mut self.parts[idx];

        if part.data == content.as_bytes() {
            return Ok(());
        }

        part.data = content.as_bytes().to_vec();
        part.modified = true;
        log::debug!("Part '{}' marked as modified", name);
        Ok(())
    }

    /// Whether any part has been rewritten.
    pub fn is_modified(&self) -> bool {
        self.parts.iter().any(|p| p.modified)
    }

    /// Names of rewritten parts, in entry order.
    pub fn modified_parts(&self) -> Vec<&str> {
        self.parts
            .iter()
            .filter(|p| p.modified)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Encode the archive.
    ///
    /// An unmodified archive is returned exactly as it was opened.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        if !self.is_modified() {
            return Ok(self.source.clone());
        }

        let mut source = ZipArchive::new(Cursor::new(self.source.as_slice()))
            .map_err(|e| Error::CorruptArchive(format!("Failed to reopen ZIP: {}", e)))?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(self.source.len())));

        for (i, part) in self.parts.iter().enumerate() {
            if part.modified {
                let mut options = FileOptions::default()
                    .compression_method(part.compression)
                    .last_modified_time(part.last_modified);
                if let Some(mode) = part.unix_mode {
                    options = options.unix_permissions(mode);
                }

                let name = part.name.as_str();
                writer
                    .start_file(name, options)
                    .map_err(|e| write_error("start", name, e))?;
                writer
                    .write_all(&part.data)
                    .map_err(|e| write_error("write", name, e))?;
            } else {
                let file = source.by_index_raw(i).map_err(|e| {
                    Error::CorruptArchive(format!("Failed to read entry {}: {}", i, e))
                })?;
                writer
                    .raw_copy_file(file)
                    .map_err(|e| write_error("copy", &part.name, e))?;
            }
        }

        let cursor = writer
            .finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish archive: {}", e)))?;

        Ok(cursor.into_inner())
    }

    fn part(&self, name: &str) -> Result<&Part> {
        self.index
            .get(name)
            .map(|&idx| &self.parts[idx])
            .ok_or_else(|| Error::MissingPart(name.to_string()))
    }
}

fn write_error(action: &str, name: &str, err: impl std::fmt::Display) -> Error {
    Error::ZipError(format!("Failed to {} '{}': {}", action, name, err))
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("parts", &self.parts.len())
            .field("modified", &self.modified_parts())
            .finish()
    }
}

/// Build an in-memory PPTX-shaped archive from `(name, content)` pairs.
#[cfg(test)]
pub(crate) fn build_test_archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        let method = if name.ends_with(".xml") {
            CompressionMethod::Deflated
        } else {
            CompressionMethod::Stored
        };
        writer
            .start_file(*name, FileOptions::default().compression_method(method))
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
