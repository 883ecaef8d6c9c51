//! Decoded page representation.
//!
//! A [Page] is a sequence of lines, each a sequence of attributed text [Block]s. Pages
//! keep the compact ndjson encoding of their lines and decode it into blocks the first
//! time [Page::lines] is called.
//!
//! # Line format
//! Every line is one JSON array of blocks, every block an array of `[attrs, text]` or
//! `[attrs, link, text]`. `attrs` is the foreground and background color letter, `_`
//! for unset, optionally followed by the character set digit:
//! ```text
//! [["wb","Hello "],["yb",200,"Sport"],["gl1","🬂🬂"]]
//! ```
use std::fmt::Display;
use std::io::Write;
use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use typed_builder::TypedBuilder;

use crate::ansi::Sgr;
use crate::{Error, Result};

/// Format of page timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// The 8 teletext colors, in teletext (and ANSI) index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Purple,
    Cyan,
    White,
}

impl Color {
    pub const ALL: [Color; 8] = [
        Color::Black,
        Color::Red,
        Color::Green,
        Color::Yellow,
        Color::Blue,
        Color::Purple,
        Color::Cyan,
        Color::White,
    ];

    const LETTERS: [char; 8] = ['b', 'r', 'g', 'y', 'l', 'm', 'c', 'w'];

    /// Color for a 3-bit teletext color index. Higher bits are ignored.
    #[must_use]
    pub fn from_index(index: u8) -> Self {
        Self::ALL[usize::from(index & 7)]
    }

    #[must_use]
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Single letter code used by the line format.
    #[must_use]
    pub fn letter(self) -> char {
        Self::LETTERS[self as usize]
    }

    #[must_use]
    pub fn from_letter(letter: char) -> Option<Self> {
        Self::LETTERS
            .iter()
            .position(|l| *l == letter)
            .map(|idx| Self::ALL[idx])
    }
}

/// Character set a block is drawn with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CharSet {
    #[default]
    Normal,
    /// Block mosaic graphics
    Alternate,
}

impl CharSet {
    /// Digit used in the line format, none for [CharSet::Normal].
    #[must_use]
    pub fn digit(self) -> Option<char> {
        match self {
            CharSet::Normal => None,
            CharSet::Alternate => Some('1'),
        }
    }

    #[must_use]
    pub fn from_digit(digit: char) -> Option<Self> {
        match digit {
            '0' => Some(CharSet::Normal),
            '1' => Some(CharSet::Alternate),
            _ => None,
        }
    }
}

impl From<bool> for CharSet {
    fn from(mosaic: bool) -> Self {
        if mosaic {
            CharSet::Alternate
        } else {
            CharSet::Normal
        }
    }
}

/// Reference from a block to another page, or to a range of pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Link {
    Single(u32),
    Range(u32, u32),
}

impl Link {
    /// Decode from an integer or a list of one or two integers.
    ///
    /// # Errors
    /// [Error::InvalidBlock] for any other value.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Array(items) => {
                let pages = items.iter().map(link_page).collect::<Result<Vec<u32>>>()?;
                match pages[..] {
                    [page] => Ok(Link::Single(page)),
                    [from, to] => Ok(Link::Range(from, to)),
                    _ => Err(Error::InvalidBlock(format!("invalid block link {value}"))),
                }
            }
            other => Ok(Link::Single(link_page(other)?)),
        }
    }

    #[must_use]
    pub fn to_json(self) -> Value {
        match self {
            Link::Single(page) => Value::from(page),
            Link::Range(from, to) => Value::from(vec![from, to]),
        }
    }
}

fn link_page(value: &Value) -> Result<u32> {
    let page = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    page.ok_or_else(|| Error::InvalidBlock(format!("invalid link page {value}")))
}

/// A run of text sharing the same attributes.
///
/// Two blocks are equal when their text and every attribute match.
///
/// # Example
/// ```
/// use teletext::page::{Block, Color, Link};
///
/// let block = Block::builder()
///     .text("Sport")
///     .color(Color::Yellow)
///     .link(Link::Single(200))
///     .build();
/// assert_eq!(block.to_json().to_string(), r#"["y_",200,"Sport"]"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct Block {
    #[builder(setter(into))]
    pub text: String,
    #[builder(default, setter(strip_option))]
    pub color: Option<Color>,
    #[builder(default, setter(strip_option))]
    pub bg_color: Option<Color>,
    #[builder(default)]
    pub char_set: CharSet,
    #[builder(default, setter(strip_option))]
    pub link: Option<Link>,
}

impl Block {
    /// Block with `text` and no attributes.
    pub fn new(text: impl Into<String>) -> Self {
        Block::builder().text(text).build()
    }

    /// True if the blocks cannot be merged into one.
    #[must_use]
    pub fn has_different_attribute(&self, other: &Block) -> bool {
        self.color != other.color
            || self.bg_color != other.bg_color
            || self.char_set != other.char_set
            || self.link != other.link
    }

    /// Split on line breaks into blocks with the same attributes.
    #[must_use]
    pub fn splitlines(&self) -> Vec<Block> {
        if !self.text.contains('\n') {
            return vec![self.clone()];
        }
        self.text
            .lines()
            .map(|text| Block {
                text: text.to_string(),
                ..self.clone()
            })
            .collect()
    }

    fn attrs(&self) -> String {
        let mut attrs: String = [self.color, self.bg_color]
            .iter()
            .map(|c| c.map_or('_', Color::letter))
            .collect();
        if let Some(digit) = self.char_set.digit() {
            attrs.push(digit);
        }
        attrs
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut block = vec![Value::from(self.attrs())];
        if let Some(link) = self.link {
            block.push(link.to_json());
        }
        block.push(Value::from(self.text.as_str()));
        Value::Array(block)
    }

    /// Decode a `[attrs, text]` or `[attrs, link, text]` array.
    ///
    /// # Errors
    /// [Error::InvalidBlock] if the value does not have that shape, uses an unknown
    /// color letter or character set, or has an invalid link.
    pub fn from_json(value: &Value) -> Result<Self> {
        let invalid = || Error::InvalidBlock(value.to_string());
        let items = value.as_array().ok_or_else(invalid)?;
        let (attrs, link, text) = match items.as_slice() {
            [attrs, text] => (attrs, None, text),
            [attrs, link, text] => (attrs, Some(link), text),
            _ => return Err(invalid()),
        };
        let attrs = attrs.as_str().ok_or_else(invalid)?;
        let text = text.as_str().ok_or_else(invalid)?;

        let mut chars = attrs.chars();
        let color = attr_color(chars.next()).ok_or_else(invalid)?;
        let bg_color = attr_color(chars.next()).ok_or_else(invalid)?;
        let char_set = match chars.next() {
            None => CharSet::Normal,
            Some(digit) => CharSet::from_digit(digit).ok_or_else(invalid)?,
        };
        if chars.next().is_some() {
            return Err(invalid());
        }
        let link = match link {
            None | Some(Value::Null) => None,
            Some(link) => Some(Link::from_json(link)?),
        };

        Ok(Block {
            text: text.to_string(),
            color,
            bg_color,
            char_set,
            link,
        })
    }

    /// Block text, wrapped in its colors if `colors`. Unset colors render white on black.
    #[must_use]
    pub fn to_ansi(&self, colors: bool) -> String {
        if !colors {
            return self.text.clone();
        }
        let sgr = Sgr::Colors {
            fg: self.color.unwrap_or(Color::White).index(),
            bg: self.bg_color.unwrap_or(Color::Black).index(),
        };
        format!("{sgr}{}{}", self.text, Sgr::Reset)
    }
}

// `Some(None)` is an explicitly unset color, `None` a bad or missing letter.
fn attr_color(letter: Option<char>) -> Option<Option<Color>> {
    match letter? {
        '_' => Some(None),
        letter => Color::from_letter(letter).map(Some),
    }
}

pub type Line = Vec<Block>;

/// Merge neighbouring blocks with equal attributes.
///
/// Order is kept and the result has the fewest blocks possible for the line.
pub fn simplify_line<I>(line: I) -> Line
where
    I: IntoIterator<Item = Block>,
{
    let mut simple: Line = Vec::new();
    for block in line {
        match simple.last_mut() {
            Some(prev) if !prev.has_different_attribute(&block) => {
                prev.text.push_str(&block.text);
            }
            _ => simple.push(block),
        }
    }
    simple
}

/// Break a line at every newline inside its blocks.
///
/// Blocks around a break keep their attributes; a block ending in a newline closes the
/// current line.
#[must_use]
pub fn split_lines(line: &[Block]) -> Vec<Line> {
    let mut lines = vec![Line::new()];
    for block in line {
        let parts = block.splitlines();
        let count = parts.len();
        for (idx, part) in parts.into_iter().enumerate() {
            if idx > 0 {
                lines.push(Line::new());
            }
            if !part.text.is_empty() {
                if let Some(current) = lines.last_mut() {
                    current.push(part);
                }
            }
            if idx + 1 == count && block.text.ends_with('\n') {
                lines.push(Line::new());
            }
        }
    }
    if lines.len() > 1 && lines.last().is_some_and(Vec::is_empty) {
        lines.pop();
    }
    lines
}

/// Decode one content line.
///
/// # Errors
/// [Error::Json] if `raw` is not a JSON array, [Error::InvalidBlock] for bad blocks.
pub fn decode_line(raw: &str) -> Result<Line> {
    let blocks: Vec<Value> = serde_json::from_str(raw)?;
    blocks.iter().map(Block::from_json).collect()
}

/// Encode one line as compact JSON.
#[must_use]
pub fn encode_line(line: &[Block]) -> String {
    Value::Array(line.iter().map(Block::to_json).collect()).to_string()
}

/// Rejoin words hyphenated across a line break, e.g. `bro-\nken` becomes `broken`.
///
/// Only applies when the next line continues with a lowercase letter.
#[must_use]
pub fn concat_split_words(text: &str) -> String {
    static SPLIT_WORD: OnceLock<Regex> = OnceLock::new();
    let rx = SPLIT_WORD.get_or_init(|| {
        Regex::new(r"(\w)-[ \t]*\n[ \t]*(\p{Ll})").expect("regex to compile")
    });
    rx.replace_all(text, "${1}${2}").into_owned()
}

/// Header record preceding a page's lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct HeaderRecord {
    pub page: u32,
    pub sub_page: u32,
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Rendering options for [Page::to_ansi].
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct AnsiOptions {
    /// Wrap blocks in their color escapes
    #[builder(default = true)]
    pub colors: bool,
    /// Draw a box around the page
    #[builder(default = false)]
    pub border: bool,
}

impl Default for AnsiOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A single teletext page.
///
/// Equality only compares the encoded content, not index, timestamp or channel.
///
/// # Example
/// ```
/// use teletext::page::{AnsiOptions, Block, Page};
///
/// let page = Page::builder()
///     .index(100)
///     .timestamp("2023-01-01T00:00:00")
///     .build()
///     .with_lines(vec![vec![Block::new("Hello")]]);
///
/// let options = AnsiOptions::builder().colors(false).build();
/// assert_eq!(page.to_ansi(&options), "Hello\n");
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct Page {
    #[builder(default = 100)]
    pub index: u32,
    #[builder(default = 1)]
    pub sub_index: u32,
    #[builder(default, setter(strip_option, into))]
    pub channel: Option<String>,
    #[builder(default, setter(strip_option, into))]
    pub timestamp: Option<String>,
    /// Set by the source when the page could not be retrieved. Such pages have no lines.
    #[builder(default, setter(strip_option, into))]
    pub error: Option<String>,
    /// Free form classification for callers. Never read or written by the ndjson format.
    #[builder(default, setter(strip_option, into))]
    pub category: Option<String>,

    #[builder(default, setter(skip))]
    raw_lines: Vec<String>,
    #[builder(default, setter(skip))]
    lines: OnceLock<Vec<Line>>,
}

/// Pages are equal when their decoded lines are, whatever their keys, timestamps and
/// raw encoding.
impl PartialEq for Page {
    fn eq(&self, other: &Self) -> bool {
        self.lines() == other.lines()
    }
}

impl Eq for Page {}

impl Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}({} lines)",
            self.index,
            self.sub_index,
            self.raw_lines.len()
        )
    }
}

impl Page {
    pub(crate) fn from_header(header: HeaderRecord, channel: Option<String>) -> Self {
        Page {
            index: header.page,
            sub_index: header.sub_page,
            channel,
            timestamp: header.timestamp,
            error: header.error,
            category: None,
            raw_lines: Vec::new(),
            lines: OnceLock::new(),
        }
    }

    pub(crate) fn header_record(&self) -> HeaderRecord {
        HeaderRecord {
            page: self.index,
            sub_page: self.sub_index,
            timestamp: self.timestamp.clone(),
            error: self.error.clone(),
        }
    }

    /// Append an encoded content line.
    pub(crate) fn push_raw_line(&mut self, line: impl Into<String>) {
        self.raw_lines.push(line.into());
        self.lines.take();
    }

    /// Replace the content with `lines`.
    #[must_use]
    pub fn with_lines(mut self, lines: Vec<Line>) -> Self {
        self.raw_lines = lines.iter().map(|line| encode_line(line)).collect();
        self.lines = OnceLock::from(lines);
        self
    }

    /// `(index, sub_index)`
    #[must_use]
    pub fn key(&self) -> (u32, u32) {
        (self.index, self.sub_index)
    }

    /// Encoded content lines as stored.
    #[must_use]
    pub fn raw_lines(&self) -> &[String] {
        &self.raw_lines
    }

    /// Decoded lines.
    ///
    /// Decoding happens once, on first access. Lines that fail to decode are logged and
    /// left out. Pages with an error have no lines.
    pub fn lines(&self) -> &[Line] {
        if self.error.is_some() {
            return &[];
        }
        self.lines.get_or_init(|| {
            self.raw_lines
                .iter()
                .enumerate()
                .filter_map(|(idx, raw)| match decode_line(raw) {
                    Ok(line) => Some(line),
                    Err(err) => {
                        warn!(
                            page = self.index,
                            sub_page = self.sub_index,
                            line = idx,
                            "skipping malformed line: {err}"
                        );
                        None
                    }
                })
                .collect()
        })
    }

    /// Parse the timestamp, if there is one.
    ///
    /// # Errors
    /// [Error::Timestamp] if it does not match [TIMESTAMP_FORMAT].
    pub fn timestamp_dt(&self) -> Result<Option<NaiveDateTime>> {
        Ok(self
            .timestamp
            .as_deref()
            .map(|ts| NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT))
            .transpose()?)
    }

    /// Write the header record followed by one record per line, unless the page has an
    /// error.
    ///
    /// # Errors
    /// [Error::Io] writing, [Error::Json] encoding the header.
    pub fn write_ndjson<W: Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer(&mut writer, &self.header_record())?;
        writer.write_all(b"\n")?;
        for line in self.lines() {
            writer.write_all(encode_line(line).as_bytes())?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    }

    /// See [Page::write_ndjson].
    ///
    /// # Errors
    /// [Error::Json] encoding the header.
    pub fn to_ndjson(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_ndjson(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Render for a terminal. Every line ends with a newline.
    ///
    /// With a border, lines are padded with spaces to the longest line and boxed with
    /// block drawing characters. Pages with an error render as an empty string.
    #[must_use]
    pub fn to_ansi(&self, options: &AnsiOptions) -> String {
        let mut out = String::new();
        if self.error.is_some() {
            return out;
        }
        let lines = self.lines();

        if !options.border {
            for line in lines {
                for block in line {
                    out.push_str(&block.to_ansi(options.colors));
                }
                out.push('\n');
            }
            return out;
        }

        let plain: Vec<String> = lines
            .iter()
            .map(|line| line.iter().map(|b| b.to_ansi(false)).collect())
            .collect();
        let width = plain.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let (edge, off) = if options.colors {
            (Sgr::Foreground(Color::White.index()).to_string(), Sgr::Reset.to_string())
        } else {
            (String::new(), String::new())
        };

        out.push_str(&format!("{edge}▛{}▜{off}\n", "▀".repeat(width)));
        for (line, text) in lines.iter().zip(plain.iter()) {
            let content = if options.colors {
                line.iter().map(|b| b.to_ansi(true)).collect()
            } else {
                text.clone()
            };
            let pad = " ".repeat(width - text.chars().count());
            out.push_str(&format!("{edge}▌{off}{content}{pad}{edge}▐{off}\n"));
        }
        out.push_str(&format!("{edge}▙{}▟{off}\n", "▄".repeat(width)));
        out
    }

    /// See [Page::to_ansi].
    ///
    /// # Errors
    /// [Error::Io] writing.
    pub fn write_ansi<W: Write>(&self, mut writer: W, options: &AnsiOptions) -> Result<()> {
        writer.write_all(self.to_ansi(options).as_bytes())?;
        Ok(())
    }

    /// Everything that is not graphics or a digit, one line per page line.
    ///
    /// With `concat_split_words`, words hyphenated over a line break are joined again.
    #[must_use]
    pub fn to_text(&self, concat_split_words: bool) -> String {
        let mut text = String::new();
        for line in self.lines() {
            for block in line {
                text.extend(block.text.chars().filter(|c| is_text_char(*c)));
            }
            text.push('\n');
        }
        if concat_split_words {
            self::concat_split_words(&text)
        } else {
            text
        }
    }
}

fn is_text_char(c: char) -> bool {
    let code = u32::from(c);
    code < 0x1bf00 && !(0x2500..0x2600).contains(&code) && !c.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn block(text: &str, color: Color) -> Block {
        Block::builder().text(text).color(color).build()
    }

    #[test]
    fn color_letters() {
        let letters: String = Color::ALL.iter().map(|c| c.letter()).collect();
        assert_eq!(letters, "brgylmcw");
        for (idx, color) in Color::ALL.iter().enumerate() {
            assert_eq!(Color::from_index(idx as u8), *color);
            assert_eq!(Color::from_letter(color.letter()), Some(*color));
        }
        assert_eq!(Color::from_letter('x'), None);
    }

    #[test]
    fn block_equality_includes_link() {
        let a = Block::builder().text("x").color(Color::Red).build();
        let mut b = a.clone();
        assert_eq!(a, b);
        b.link = Some(Link::Single(100));
        assert_ne!(a, b);
        assert!(a.has_different_attribute(&b));

        let c = Block::builder().text("y").color(Color::Red).build();
        assert_ne!(a, c);
        assert!(!a.has_different_attribute(&c));
    }

    #[test_case(json!(["wb", "Hi"]), Some(Color::White), Some(Color::Black), CharSet::Normal, None; "colors")]
    #[test_case(json!(["__1", "x"]), None, None, CharSet::Alternate, None; "unset with char set")]
    #[test_case(json!(["rg", 123, "x"]), Some(Color::Red), Some(Color::Green), CharSet::Normal, Some(Link::Single(123)); "single link")]
    #[test_case(json!(["c_", [100, 101], "x"]), Some(Color::Cyan), None, CharSet::Normal, Some(Link::Range(100, 101)); "range link")]
    #[test_case(json!(["_m", [300], "x"]), None, Some(Color::Purple), CharSet::Normal, Some(Link::Single(300)); "one element list link")]
    fn block_from_json(
        value: Value,
        color: Option<Color>,
        bg_color: Option<Color>,
        char_set: CharSet,
        link: Option<Link>,
    ) {
        let block = Block::from_json(&value).unwrap();
        assert_eq!(block.color, color);
        assert_eq!(block.bg_color, bg_color);
        assert_eq!(block.char_set, char_set);
        assert_eq!(block.link, link);
    }

    #[test_case(json!("wb"); "not an array")]
    #[test_case(json!(["wb"]); "too short")]
    #[test_case(json!(["w", "x"]); "short attrs")]
    #[test_case(json!(["zb", "x"]); "unknown color")]
    #[test_case(json!(["wbx", "x"]); "bad char set")]
    #[test_case(json!(["wb2", "x"]); "unknown char set")]
    #[test_case(json!(["wb12", "x"]); "trailing attrs")]
    #[test_case(json!(["wb", [1, 2, 3], "x"]); "three page link")]
    #[test_case(json!(["wb", 1, 2, "x"]); "too long")]
    fn block_from_json_rejects(value: Value) {
        assert!(matches!(Block::from_json(&value), Err(Error::InvalidBlock(_))));
    }

    #[test]
    fn block_to_json() {
        let block = Block::builder()
            .text("Sport")
            .color(Color::Yellow)
            .bg_color(Color::Blue)
            .char_set(CharSet::Alternate)
            .link(Link::Range(200, 201))
            .build();
        assert_eq!(block.to_json(), json!(["yl1", [200, 201], "Sport"]));
        assert_eq!(Block::new("x").to_json(), json!(["__", "x"]));
    }

    #[test]
    fn every_char_set_survives_json() {
        for char_set in [CharSet::Normal, CharSet::Alternate] {
            let block = Block::builder().text("x").char_set(char_set).build();
            assert_eq!(Block::from_json(&block.to_json()).unwrap(), block);
        }
        let explicit = Block::from_json(&json!(["wb0", "x"])).unwrap();
        assert_eq!(explicit.char_set, CharSet::Normal);
        assert_eq!(explicit.to_json(), json!(["wb", "x"]));
    }

    #[test]
    fn block_splitlines() {
        let b = Block::builder()
            .text("one\ntwo")
            .color(Color::Green)
            .link(Link::Single(101))
            .build();
        let parts = b.splitlines();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].text, "one");
        assert_eq!(parts[1].text, "two");
        assert!(!parts[0].has_different_attribute(&b));
        assert!(!parts[1].has_different_attribute(&b));
    }

    #[test]
    fn split_lines_fans_out_breaks() {
        let line = vec![block("a\nb", Color::Red), block("c", Color::Green)];
        let lines = split_lines(&line);
        assert_eq!(
            lines,
            vec![
                vec![block("a", Color::Red)],
                vec![block("b", Color::Red), block("c", Color::Green)],
            ]
        );

        let line = vec![block("a\n", Color::Red), block("b", Color::Green)];
        assert_eq!(
            split_lines(&line),
            vec![vec![block("a", Color::Red)], vec![block("b", Color::Green)]]
        );
    }

    #[test]
    fn simplify_merges_equal_attributes() {
        let line = vec![
            block("a", Color::Red),
            block("b", Color::Red),
            block("c", Color::Green),
            block("d", Color::Red),
            block("e", Color::Red),
        ];
        let simple = simplify_line(line);
        assert_eq!(
            simple,
            vec![
                block("ab", Color::Red),
                block("c", Color::Green),
                block("de", Color::Red)
            ]
        );
        assert_eq!(simplify_line(simple.clone()), simple);
        assert!(simplify_line(Vec::new()).is_empty());
    }

    #[test]
    fn simplify_keeps_links_apart() {
        let a = Block::builder().text("1").link(Link::Single(100)).build();
        let b = Block::builder().text("2").link(Link::Single(101)).build();
        assert_eq!(simplify_line(vec![a.clone(), b.clone()]), vec![a, b]);
    }

    fn sample_page() -> Page {
        let mut page = Page::builder()
            .index(100)
            .sub_index(1)
            .timestamp("2023-01-01T00:00:00")
            .build();
        page.push_raw_line(r#"[["wb","Hello "],["yb",200,"Sport"]]"#);
        page.push_raw_line(r#"[["gl1","🬂🬂"],["__","Ä 42 bro-"]]"#);
        page.push_raw_line(r#"[["wb","ken"]]"#);
        page
    }

    #[test]
    fn ndjson_roundtrip() {
        let page = sample_page();
        let ndjson = page.to_ndjson().unwrap();
        let expected = concat!(
            r#"{"page":100,"sub_page":1,"timestamp":"2023-01-01T00:00:00"}"#,
            "\n",
            r#"[["wb","Hello "],["yb",200,"Sport"]]"#,
            "\n",
            r#"[["gl1","🬂🬂"],["__","Ä 42 bro-"]]"#,
            "\n",
            r#"[["wb","ken"]]"#,
            "\n",
        );
        assert_eq!(ndjson, expected);

        let decoded = Page::builder().build().with_lines(page.lines().to_vec());
        assert_eq!(decoded, page);
        assert_eq!(decoded.lines(), page.lines());
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let mut page = sample_page();
        page.push_raw_line("[[\"wb\"");
        page.push_raw_line(r#"[["qq","x"]]"#);
        page.push_raw_line(r#"[["wb","end"]]"#);
        assert_eq!(page.lines().len(), 4);
        let end = Block::builder()
            .text("end")
            .color(Color::White)
            .bg_color(Color::Black)
            .build();
        assert_eq!(page.lines()[3], vec![end]);
    }

    #[test]
    fn error_page_renders_nothing() {
        let mut page = Page::builder()
            .index(100)
            .timestamp("2023-01-01T00:00:00")
            .error("timeout")
            .build();
        page.push_raw_line(r#"[["wb","ignored"]]"#);

        assert!(page.lines().is_empty());
        assert_eq!(page.to_ansi(&AnsiOptions::default()), "");
        let bordered = AnsiOptions::builder().border(true).build();
        assert_eq!(page.to_ansi(&bordered), "");
        assert_eq!(page.to_text(true), "");
        assert_eq!(
            page.to_ndjson().unwrap(),
            "{\"page\":100,\"sub_page\":1,\"timestamp\":\"2023-01-01T00:00:00\",\"error\":\"timeout\"}\n"
        );
    }

    #[test]
    fn ansi_plain_and_colored() {
        let page = Page::builder().build().with_lines(vec![
            vec![block("ab", Color::Red), Block::new("c")],
            vec![],
        ]);
        let plain = AnsiOptions::builder().colors(false).build();
        assert_eq!(page.to_ansi(&plain), "abc\n\n");
        assert_eq!(
            page.to_ansi(&AnsiOptions::default()),
            "\x1b[31;40mab\x1b[0m\x1b[37;40mc\x1b[0m\n\n"
        );
    }

    #[test]
    fn ansi_border() {
        let page = Page::builder()
            .build()
            .with_lines(vec![vec![Block::new("abc")], vec![Block::new("Ä")]]);
        let options = AnsiOptions::builder().colors(false).border(true).build();
        assert_eq!(
            page.to_ansi(&options),
            "▛▀▀▀▜\n▌abc▐\n▌Ä  ▐\n▙▄▄▄▟\n"
        );

        let colored = AnsiOptions::builder().border(true).build();
        let out = page.to_ansi(&colored);
        assert!(out.starts_with("\x1b[37m▛▀▀▀▜\x1b[0m\n"));
        assert!(out.contains("\x1b[37m▌\x1b[0m\x1b[37;40mÄ\x1b[0m  \x1b[37m▐\x1b[0m\n"));
    }

    #[test]
    fn text_extraction() {
        let page = sample_page();
        assert_eq!(page.to_text(false), "Hello Sport\nÄ  bro-\nken\n");
        assert_eq!(page.to_text(true), "Hello Sport\nÄ  broken\n");
    }

    #[test]
    fn concat_only_lowercase_continuations() {
        assert_eq!(concat_split_words("bro-\nken lines"), "broken lines");
        assert_eq!(concat_split_words("Nord-\nSüd"), "Nord-\nSüd");
        assert_eq!(concat_split_words("- \nlist"), "- \nlist");
    }

    #[test]
    fn page_display_and_timestamp() {
        let page = sample_page();
        assert_eq!(page.to_string(), "100/1(3 lines)");
        let dt = page.timestamp_dt().unwrap().unwrap();
        assert_eq!(dt.to_string(), "2023-01-01 00:00:00");

        let bad = Page::builder().timestamp("yesterday").build();
        assert!(matches!(bad.timestamp_dt(), Err(Error::Timestamp(_))));
        assert!(Page::builder().build().timestamp_dt().unwrap().is_none());
    }

    #[test]
    fn equality_ignores_metadata() {
        let a = sample_page();
        let mut b = sample_page();
        b.index = 200;
        b.timestamp = Some("2024-01-01T00:00:00".to_string());
        assert_eq!(a, b);
        b.push_raw_line("[]");
        assert_ne!(a, b);
    }

    #[test]
    fn equality_ignores_encoding() {
        let mut a = Page::builder().build();
        a.push_raw_line(r#"[ ["wb", "x"] ,["yb", 200, "y"]]"#);
        let mut b = Page::builder().build();
        b.push_raw_line(r#"[["wb","x"],["yb",200,"y"]]"#);
        b.push_raw_line("not json");
        assert_eq!(a, b);
    }
}
