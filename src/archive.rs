//! Reading packet archives of the teletext_ng capture tool.
//!
//! A capture run produces a zip archive holding one zip per capture, each named with
//! the capture's timestamp (e.g., `2023-01-01T12:00:00.zip`). The inner archives hold
//! one file of raw T42 packets per page, named `<page>-<sub_page>.t42`.
//!
//! Archives can be large, so [ArchivePages] reads lazily and holds at most one inner
//! archive in memory at a time.
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use regex::Regex;
use tracing::debug;
use zip::ZipArchive;

use crate::t42::{T42Page, PACKET_LEN};
use crate::Result;

/// One page file read from an inner archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Timestamp of the capture, from the inner archive's name.
    pub timestamp: String,
    /// Page number as given in the file name, e.g., `100`.
    pub page: u32,
    pub sub_page: u32,
    /// Raw T42 packets
    pub data: Vec<u8>,
}

impl ArchiveEntry {
    #[must_use]
    pub fn into_t42(self) -> T42Page {
        T42Page::new(self.data).with_timestamp(self.timestamp)
    }
}

/// Outer teletext_ng archive.
pub struct TeletextNg<R: Read + Seek> {
    archive: ZipArchive<R>,
    timestamp_re: Regex,
    page_re: Regex,
}

impl TeletextNg<File> {
    /// # Errors
    /// [crate::Error::Io] opening the file, [crate::Error::Zip] if it is not a zip archive.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(File::open(path)?)
    }
}

impl<R: Read + Seek> TeletextNg<R> {
    /// # Errors
    /// [crate::Error::Zip] if `reader` is not a zip archive.
    pub fn new(reader: R) -> Result<Self> {
        Ok(Self {
            archive: ZipArchive::new(reader)?,
            timestamp_re: Regex::new(r"(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2})")
                .expect("regex to compile"),
            page_re: Regex::new(r"(\d{3})-(\d+)\.t42$").expect("regex to compile"),
        })
    }

    /// Number of members in the outer archive.
    #[must_use]
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// Iterate over every page file of every capture, in archive order.
    ///
    /// Members of the outer archive without a timestamp in their name and page files
    /// not named `<page>-<sub_page>.t42` are skipped. The iterator is single pass.
    #[must_use]
    pub fn iter_pages(self) -> ArchivePages<R> {
        ArchivePages {
            source: self,
            next_outer: 0,
            inner: None,
        }
    }

    fn open_inner(&mut self, idx: usize) -> Result<Option<InnerArchive>> {
        let mut file = self.archive.by_index(idx)?;
        let name = file.name().to_string();
        let Some(caps) = self.timestamp_re.captures(&name) else {
            debug!(name = %name, "skipping archive member without timestamp");
            return Ok(None);
        };
        let timestamp = caps[1].to_string();

        let mut buf = Vec::with_capacity(usize::try_from(file.size()).unwrap_or_default());
        file.read_to_end(&mut buf)?;
        debug!(name = %name, timestamp = %timestamp, bytes = buf.len(), "reading capture");

        Ok(Some(InnerArchive {
            timestamp,
            archive: ZipArchive::new(Cursor::new(buf))?,
            next: 0,
        }))
    }
}

struct InnerArchive {
    timestamp: String,
    archive: ZipArchive<Cursor<Vec<u8>>>,
    next: usize,
}

impl InnerArchive {
    fn read_entry(&mut self, idx: usize, page_re: &Regex) -> Result<Option<ArchiveEntry>> {
        let mut file = self.archive.by_index(idx)?;
        let name = file.name().to_string();
        let parsed = page_re.captures(&name).and_then(|caps| {
            let page = caps[1].parse::<u32>().ok()?;
            let sub_page = caps[2].parse::<u32>().ok()?;
            Some((page, sub_page))
        });
        let Some((page, sub_page)) = parsed else {
            debug!(name = %name, "skipping file that is not a page");
            return Ok(None);
        };

        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        if data.len() % PACKET_LEN != 0 {
            debug!(
                name = %name,
                len = data.len(),
                "trailing {} bytes are not a complete packet",
                data.len() % PACKET_LEN
            );
        }

        Ok(Some(ArchiveEntry {
            timestamp: self.timestamp.clone(),
            page,
            sub_page,
            data,
        }))
    }
}

/// Iterator returned by [TeletextNg::iter_pages].
///
/// A read error is yielded in place of the failing member, iteration continues with the
/// following one.
pub struct ArchivePages<R: Read + Seek> {
    source: TeletextNg<R>,
    next_outer: usize,
    inner: Option<InnerArchive>,
}

impl<R: Read + Seek> Iterator for ArchivePages<R> {
    type Item = Result<ArchiveEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(inner) = &mut self.inner {
                if inner.next < inner.archive.len() {
                    let idx = inner.next;
                    inner.next += 1;
                    match inner.read_entry(idx, &self.source.page_re) {
                        Ok(Some(entry)) => return Some(Ok(entry)),
                        Ok(None) => continue,
                        Err(err) => return Some(Err(err)),
                    }
                }
                self.inner = None;
            }

            if self.next_outer >= self.source.archive.len() {
                return None;
            }
            let idx = self.next_outer;
            self.next_outer += 1;
            match self.source.open_inner(idx) {
                Ok(Some(inner)) => self.inner = Some(inner),
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::t42::tests::{header_packet, row_packet};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in files {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn page_data(page: u8, text: &[u8]) -> Vec<u8> {
        let mut data = header_packet(1, page, 1, 0, b"HEADER");
        data.extend(row_packet(1, 1, text));
        data
    }

    fn fixture() -> Vec<u8> {
        let first = zip_bytes(&[
            ("100-1.t42", page_data(0x00, b"Hallo").as_slice()),
            ("readme.txt", b"not a page".as_slice()),
            ("101-01.t42", page_data(0x01, b"Welt").as_slice()),
        ]);
        let second = zip_bytes(&[("100-2.t42", page_data(0x00, b"Zweite").as_slice())]);
        zip_bytes(&[
            ("capture/2023-01-01T12:00:00.zip", first.as_slice()),
            ("notes.txt", b"no timestamp".as_slice()),
            ("capture/2023-01-01T12:05:00.zip", second.as_slice()),
        ])
    }

    #[test]
    fn iterates_all_pages() {
        let archive = TeletextNg::new(Cursor::new(fixture())).unwrap();
        assert_eq!(archive.len(), 3);

        let entries: Vec<ArchiveEntry> = archive
            .iter_pages()
            .collect::<Result<Vec<_>>>()
            .unwrap();

        let keys: Vec<(&str, u32, u32)> = entries
            .iter()
            .map(|e| (e.timestamp.as_str(), e.page, e.sub_page))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("2023-01-01T12:00:00", 100, 1),
                ("2023-01-01T12:00:00", 101, 1),
                ("2023-01-01T12:05:00", 100, 2),
            ]
        );
        assert_eq!(entries[0].data.len(), 2 * PACKET_LEN);
    }

    #[test]
    fn entries_decode() {
        let archive = TeletextNg::new(Cursor::new(fixture())).unwrap();
        let entry = archive.iter_pages().nth(1).unwrap().unwrap();
        let t42 = entry.into_t42();
        assert_eq!(t42.timestamp.as_deref(), Some("2023-01-01T12:00:00"));
        assert_eq!(t42.page_number(), Some(101));
        assert!(t42.rows()[1].text().starts_with("Welt"));
    }

    #[test]
    fn open_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&fixture()).unwrap();
        file.flush().unwrap();

        let archive = TeletextNg::open(file.path()).unwrap();
        assert_eq!(archive.iter_pages().count(), 3);
    }

    #[test]
    fn not_a_zip() {
        assert!(matches!(
            TeletextNg::new(Cursor::new(b"garbage".to_vec())),
            Err(crate::Error::Zip(_))
        ));
    }

    #[test]
    fn broken_inner_archive_yields_error() {
        let inner = zip_bytes(&[("100-1.t42", page_data(0x00, b"ok").as_slice())]);
        let outer = zip_bytes(&[
            ("2023-01-01T12:00:00.zip", b"not a zip".as_slice()),
            ("2023-01-01T12:05:00.zip", inner.as_slice()),
        ]);
        let results: Vec<_> = TeletextNg::new(Cursor::new(outer))
            .unwrap()
            .iter_pages()
            .collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());
        assert_eq!(results[1].as_ref().unwrap().page, 100);
    }
}
