//! Pages of one channel at one point in time.
use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::page::{HeaderRecord, Page};
use crate::{Error, Result};

/// `(page, sub_page)`
pub type PageKey = (u32, u32);

/// Stray bytes some scraped files contain, removed before decoding.
pub const SCRAPER_ARTIFACT: &[u8] = b"\x96\xc2\x00\x0a";

/// Direction for [Teletext::get_next_page].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
    /// The given page if it exists, otherwise the next one
    Nearest,
}

/// Leading record of a scraped file, naming the channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionRecord {
    scraper: String,
    timestamp: Option<String>,
}

/// Container of [Page]s indexed by [PageKey].
///
/// # Example
/// ```
/// use teletext::{Direction, Teletext};
///
/// let tt = Teletext::from_ndjson_str(r#"
/// {"scraper":"ard","timestamp":"2023-01-01T00:00:00"}
/// {"page":100,"sub_page":1,"timestamp":"2023-01-01T00:00:00"}
/// [["wb","ARD Text"]]
/// {"page":200,"sub_page":1,"timestamp":"2023-01-01T00:00:01"}
/// [["yb","Sport"]]
/// "#).unwrap();
///
/// assert_eq!(tt.channel.as_deref(), Some("ard"));
/// assert_eq!(tt.get_next_page(200, 1, Direction::Forward), Some((100, 1)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Teletext {
    pub channel: Option<String>,
    pub timestamp: Option<String>,
    pages: HashMap<PageKey, Page>,
    page_index: Vec<PageKey>,
}

impl Display for Teletext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Teletext({}, {}, {})",
            self.timestamp.as_deref().unwrap_or("-"),
            self.channel.as_deref().unwrap_or("-"),
            self.pages.len()
        )
    }
}

impl Teletext {
    /// Build from ndjson lines.
    ///
    /// A `{"scraper": .., "timestamp": ..}` record sets the channel and timestamp, page
    /// header records start a new page and every other line is content of the current
    /// page. Content is stored as is and only decoded when a page's lines are used.
    /// Blank lines are ignored. A page header repeating an earlier key replaces that
    /// page.
    ///
    /// # Errors
    /// [Error::LineBeforePage] for content before the first page header,
    /// [Error::Json] or [Error::InvalidHeader] for unreadable header records.
    pub fn from_ndjson_lines<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tt = Teletext::default();
        let mut current: Option<PageKey> = None;

        for (idx, line) in lines.into_iter().enumerate() {
            let line = line.as_ref().trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() {
                continue;
            }

            if !line.starts_with('{') {
                let Some(key) = current else {
                    return Err(Error::LineBeforePage { line: idx + 1 });
                };
                if let Some(page) = tt.pages.get_mut(&key) {
                    page.push_raw_line(line);
                }
                continue;
            }

            let record: Value = serde_json::from_str(line)?;
            if record.get("scraper").is_some() {
                let session: SessionRecord =
                    serde_json::from_value(record).map_err(|err| Error::InvalidHeader {
                        line: idx + 1,
                        reason: err.to_string(),
                    })?;
                tt.channel = Some(session.scraper);
                tt.timestamp = session.timestamp;
                continue;
            }

            let header: HeaderRecord =
                serde_json::from_value(record).map_err(|err| Error::InvalidHeader {
                    line: idx + 1,
                    reason: err.to_string(),
                })?;
            let page = Page::from_header(header, tt.channel.clone());
            trace!(page = page.index, sub_page = page.sub_index, "page header");
            current = Some(page.key());
            tt.insert(page);
        }

        tt.page_index.sort_unstable();
        Ok(tt)
    }

    /// See [Teletext::from_ndjson_lines].
    ///
    /// # Errors
    /// See [Teletext::from_ndjson_lines].
    pub fn from_ndjson_str(text: &str) -> Result<Self> {
        Self::from_ndjson_lines(text.lines())
    }

    /// Decode UTF-8 ndjson with any [SCRAPER_ARTIFACT]s removed.
    ///
    /// # Errors
    /// [Error::Io] if the bytes are not UTF-8, otherwise see [Teletext::from_ndjson_lines].
    pub fn from_ndjson_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes = strip_artifacts(bytes);
        let text = String::from_utf8(bytes)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        Self::from_ndjson_str(&text)
    }

    /// Read everything from `reader`, see [Teletext::from_ndjson_bytes].
    ///
    /// # Errors
    /// [Error::Io] reading, otherwise see [Teletext::from_ndjson_bytes].
    pub fn from_ndjson_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Self::from_ndjson_bytes(&buf)
    }

    /// # Errors
    /// [Error::Io] reading, otherwise see [Teletext::from_ndjson_lines].
    pub fn from_ndjson_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_ndjson_str(&fs::read_to_string(path)?)
    }

    /// Build from already decoded pages, e.g., from [crate::t42::T42Page::to_page].
    pub fn from_pages<I>(channel: Option<String>, timestamp: Option<String>, pages: I) -> Self
    where
        I: IntoIterator<Item = Page>,
    {
        let mut tt = Teletext {
            channel,
            timestamp,
            ..Default::default()
        };
        for page in pages {
            tt.insert(page);
        }
        tt.page_index.sort_unstable();
        tt
    }

    // Caller is responsible for sorting the index afterwards.
    fn insert(&mut self, page: Page) {
        let key = page.key();
        if self.pages.insert(key, page).is_none() {
            self.page_index.push(key);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// All page keys, sorted.
    #[must_use]
    pub fn page_index(&self) -> &[PageKey] {
        &self.page_index
    }

    /// All pages in key order.
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.page_index.iter().filter_map(|key| self.pages.get(key))
    }

    /// The exact page if `sub_page` is given, otherwise the first sub-page of `page`.
    #[must_use]
    pub fn get_page(&self, page: u32, sub_page: Option<u32>) -> Option<&Page> {
        if let Some(sub_page) = sub_page {
            return self.pages.get(&(page, sub_page));
        }
        let idx = self.page_index.partition_point(|key| key.0 < page);
        match self.page_index.get(idx) {
            Some(key) if key.0 == page => self.pages.get(key),
            _ => None,
        }
    }

    /// Key of the page following (or preceding) `(page, sub_page)`, which does not need
    /// to exist.
    ///
    /// Navigation wraps around: forward from the last page is the first page, backward
    /// from the first is the last. `None` only for an empty container.
    #[must_use]
    pub fn get_next_page(&self, page: u32, sub_page: u32, direction: Direction) -> Option<PageKey> {
        let key = (page, sub_page);
        let first = *self.page_index.first()?;
        let last = *self.page_index.last()?;

        let next = match direction {
            Direction::Nearest => {
                let idx = self.page_index.partition_point(|k| *k < key);
                self.page_index.get(idx).copied().unwrap_or(first)
            }
            Direction::Forward => {
                let idx = self.page_index.partition_point(|k| *k <= key);
                self.page_index.get(idx).copied().unwrap_or(first)
            }
            Direction::Backward => {
                let idx = self.page_index.partition_point(|k| *k < key);
                match idx {
                    0 => last,
                    idx => self.page_index[idx - 1],
                }
            }
        };
        Some(next)
    }

    /// Write the session record, if there is a channel, followed by every page in key
    /// order.
    ///
    /// # Errors
    /// [Error::Io] writing, [Error::Json] encoding.
    pub fn write_ndjson<W: Write>(&self, mut writer: W) -> Result<()> {
        if let Some(channel) = &self.channel {
            let session = SessionRecord {
                scraper: channel.clone(),
                timestamp: self.timestamp.clone(),
            };
            serde_json::to_writer(&mut writer, &session)?;
            writer.write_all(b"\n")?;
        }
        for page in self.pages() {
            page.write_ndjson(&mut writer)?;
        }
        Ok(())
    }

    /// See [Teletext::write_ndjson].
    ///
    /// # Errors
    /// [Error::Json] encoding.
    pub fn to_ndjson(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_ndjson(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

fn strip_artifacts(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut pos = 0;
    while pos < bytes.len() {
        if bytes[pos..].starts_with(SCRAPER_ARTIFACT) {
            pos += SCRAPER_ARTIFACT.len();
        } else {
            out.push(bytes[pos]);
            pos += 1;
        }
    }
    out
}
