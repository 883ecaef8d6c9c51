//! T42 teletext packet parsing.
//!
//! A T42 stream is a sequence of 42 byte packets as sliced from the VBI: 2 Hamming
//! 8/4 protected address bytes (magazine and row) followed by 40 bytes of row data.
//! Row 0 is the page header, which spends another 8 protected bytes on the page
//! number, sub-page and control bits before its 32 displayable bytes.
//!
//! Parsing never fails. Damaged or short packets decode to whatever their bits say and
//! rows are padded to [ROW_LEN] cells.
//!
//! References:
//! * ETSI EN 300 706 Enhanced Teletext specification
//! * <https://github.com/Casandro/teletext_ng/blob/main/tools/dump_tta_text_colour.c>
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::ansi::Sgr;
use crate::glyph::{glyph_to_char, select_glyph};
use crate::hamming::{decode_byte, decode_nibble};
use crate::page::{simplify_line, Block, CharSet, Color, Line, Page};

/// Bytes per packet.
pub const PACKET_LEN: usize = 42;
/// Cells per decoded row.
pub const ROW_LEN: usize = 40;
/// Rows that make up the visible page, the header and 24 content rows.
pub const DISPLAY_ROWS: u8 = 25;

const WHITE: u8 = 7;
const BLACK: u8 = 0;

/// Magazine and packet address (MPAG).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    pub magazine: u8,
    pub row: u8,
}

impl Address {
    pub const LEN: usize = 2;

    /// Decode from the first 2 bytes of `buf`. Missing bytes decode as 0.
    #[must_use]
    pub fn decode(buf: &[u8]) -> Self {
        let byte = |idx: usize| buf.get(idx).copied().unwrap_or(0);
        let mpag = decode_byte(byte(0), byte(1));
        Address {
            magazine: mpag & 0x7,
            row: mpag >> 3,
        }
    }
}

/// Page header carried by row 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageHeader {
    pub magazine: u8,
    /// Magazine and page as broadcast, 0x100-0x8FF. Magazine 0 is addressed as 8.
    pub address: u16,
    /// Sub-page code with the control bits masked out; never 0.
    pub sub_page: u16,
    /// National option character set, 0-7
    pub language: u8,
}

impl PageHeader {
    /// Protected bytes following the packet address
    pub const LEN: usize = 8;
    const SUB_PAGE_MASK: u16 = 0x3f7f;

    /// Decode from the [PageHeader::LEN] bytes following the packet address. Missing
    /// bytes decode as 0.
    #[must_use]
    pub fn decode(magazine: u8, buf: &[u8]) -> Self {
        let nibble = |idx: usize| u16::from(decode_nibble(buf.get(idx).copied().unwrap_or(0)));
        let page = nibble(1) << 4 | nibble(0);
        let sub = nibble(2) | nibble(3) << 4 | nibble(4) << 8 | nibble(5) << 12;
        let control = nibble(7) << 4 | nibble(6);

        let mut address = u16::from(magazine & 0x7) << 8 | page;
        if address < 0x100 {
            address |= 0x800;
        }
        let sub_page = match sub & Self::SUB_PAGE_MASK {
            0 => 1,
            masked => masked,
        };

        PageHeader {
            magazine: magazine & 0x7,
            address,
            sub_page,
            language: ((control >> 4) & 0x7) as u8,
        }
    }

    /// The address read as a decimal page number, e.g. 0x100 is page 100.
    ///
    /// Returns `None` for addresses with hex digits above 9, which are not displayable
    /// pages.
    #[must_use]
    pub fn page_number(&self) -> Option<u16> {
        let digits = [
            self.address >> 8 & 0xf,
            self.address >> 4 & 0xf,
            self.address & 0xf,
        ];
        if digits.iter().any(|d| *d > 9) {
            return None;
        }
        Some(digits[0] * 100 + digits[1] * 10 + digits[2])
    }
}

/// One character position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: u8,
    pub bg: u8,
    /// Block mosaic set active
    pub mosaic: bool,
}

impl Cell {
    #[must_use]
    pub fn to_block(self) -> Block {
        Block::builder()
            .text(self.ch.to_string())
            .color(Color::from_index(self.fg))
            .bg_color(Color::from_index(self.bg))
            .char_set(CharSet::from(self.mosaic))
            .build()
    }
}

/// Attribute state machine for a single row.
///
/// Spacing attributes (codes below 0x20) occupy a cell that is shown as a space in the
/// attributes in effect before the code, i.e., changes are "set-after".
#[derive(Debug, Clone)]
pub struct RowParser {
    language: u8,
    fg: u8,
    bg: u8,
    mosaic: bool,
}

impl RowParser {
    #[must_use]
    pub fn new(language: u8) -> Self {
        RowParser {
            language,
            fg: WHITE,
            bg: BLACK,
            mosaic: false,
        }
    }

    fn blank(&self) -> Cell {
        Cell {
            ch: ' ',
            fg: self.fg,
            bg: self.bg,
            mosaic: self.mosaic,
        }
    }

    /// Consume one row byte and return its cell. The parity bit is ignored.
    pub fn next_cell(&mut self, byte: u8) -> Cell {
        let code = byte & 0x7f;
        if code >= 0x20 {
            let glyph = select_glyph(code, self.mosaic, self.language);
            return Cell {
                ch: glyph_to_char(glyph).unwrap_or(' '),
                ..self.blank()
            };
        }

        let cell = self.blank();
        match code {
            0x00..=0x07 => {
                self.fg = code & 0x7;
                self.mosaic = false;
            }
            0x10..=0x17 => {
                self.fg = code & 0x7;
                self.mosaic = true;
            }
            0x1c => self.bg = BLACK,
            0x1d => self.bg = self.fg,
            _ => {}
        }
        cell
    }

    /// Parse `content` into a full row, after `lead` blank cells.
    ///
    /// Excess bytes are dropped; short rows are padded with blanks in the final state.
    #[must_use]
    pub fn parse(mut self, lead: usize, content: &[u8]) -> [Cell; ROW_LEN] {
        let mut cells = [self.blank(); ROW_LEN];
        let mut pos = lead.min(ROW_LEN);
        for byte in content {
            if pos == ROW_LEN {
                break;
            }
            cells[pos] = self.next_cell(*byte);
            pos += 1;
        }
        let pad = self.blank();
        for cell in &mut cells[pos..] {
            *cell = pad;
        }
        cells
    }
}

/// A decoded row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub address: Address,
    /// Only set for row 0
    pub header: Option<PageHeader>,
    pub cells: [Cell; ROW_LEN],
}

impl Row {
    /// Displayed characters without attributes.
    #[must_use]
    pub fn text(&self) -> String {
        self.cells.iter().map(|c| c.ch).collect()
    }

    /// The row as a simplified line of blocks.
    #[must_use]
    pub fn to_line(&self) -> Line {
        simplify_line(self.cells.iter().map(|c| c.to_block()))
    }
}

/// A single packet, borrowed from its buffer. At most [PACKET_LEN] bytes are used.
#[derive(Debug, Clone, Copy)]
pub struct Packet<'a> {
    data: &'a [u8],
}

impl<'a> Packet<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Packet {
            data: &data[..data.len().min(PACKET_LEN)],
        }
    }

    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    #[must_use]
    pub fn address(&self) -> Address {
        Address::decode(self.data)
    }

    /// Page header, if this is a row 0 packet.
    #[must_use]
    pub fn header(&self) -> Option<PageHeader> {
        let address = self.address();
        if address.row != 0 {
            return None;
        }
        let buf = self.data.get(Address::LEN..).unwrap_or(&[]);
        Some(PageHeader::decode(address.magazine, buf))
    }

    /// Decode the row. Header rows use their own language, other rows `language`.
    #[must_use]
    pub fn parse_row(&self, language: u8) -> Row {
        let address = self.address();
        let header = self.header();
        let (language, start) = match header {
            Some(h) => (h.language, Address::LEN + PageHeader::LEN),
            None => (language, Address::LEN),
        };
        let content = self.data.get(start..).unwrap_or(&[]);
        let cells = RowParser::new(language).parse(start - Address::LEN, content);
        Row {
            address,
            header,
            cells,
        }
    }
}

/// Iterate over the complete packets in `data`. A trailing partial packet is ignored.
pub fn packets(data: &[u8]) -> impl Iterator<Item = Packet<'_>> {
    data.chunks_exact(PACKET_LEN).map(Packet::new)
}

#[derive(Debug, Clone, Default)]
struct Decoded {
    header: Option<PageHeader>,
    rows: Vec<Row>,
}

fn decode_packets(data: &[u8]) -> Decoded {
    let mut decoded = Decoded::default();
    let mut language = 0;
    for packet in packets(data) {
        let row = packet.parse_row(language);
        if let Some(header) = row.header {
            language = header.language;
            decoded.header = Some(header);
        }
        decoded.rows.push(row);
    }
    decoded
}

/// The packets captured for one page.
///
/// Packets are decoded once, on first access. The language from a header applies to
/// the rows following it.
#[derive(Debug, Clone)]
pub struct T42Page {
    pub data: Vec<u8>,
    pub timestamp: Option<String>,
    pub channel: Option<String>,
    decoded: OnceLock<Decoded>,
}

impl T42Page {
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        T42Page {
            data,
            timestamp: None,
            channel: None,
            decoded: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    #[must_use]
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    fn decoded(&self) -> &Decoded {
        self.decoded.get_or_init(|| decode_packets(&self.data))
    }

    /// All rows, in packet order.
    pub fn rows(&self) -> &[Row] {
        &self.decoded().rows
    }

    /// The last page header seen.
    pub fn header(&self) -> Option<&PageHeader> {
        self.decoded().header.as_ref()
    }

    #[must_use]
    pub fn page_number(&self) -> Option<u16> {
        self.header().and_then(PageHeader::page_number)
    }

    #[must_use]
    pub fn sub_page(&self) -> Option<u16> {
        self.header().map(|h| h.sub_page)
    }

    #[must_use]
    pub fn language(&self) -> u8 {
        self.header().map_or(0, |h| h.language)
    }

    /// Render rows in packet order with color escapes.
    ///
    /// Colors are only emitted when they change and are reset at the end of every row.
    /// The first row is skipped unless `header`, rows after the 24th unless `extra`.
    #[must_use]
    pub fn to_ansi_colored(&self, header: bool, extra: bool) -> String {
        let mut lines = Vec::new();
        for (idx, row) in self.rows().iter().enumerate() {
            if idx == 0 && !header {
                continue;
            }
            if idx > 23 && !extra {
                break;
            }
            let mut line = String::new();
            let mut color = (WHITE, BLACK);
            for cell in &row.cells {
                if (cell.fg, cell.bg) != color {
                    color = (cell.fg, cell.bg);
                    line.push_str(&Sgr::Colors { fg: cell.fg, bg: cell.bg }.to_string());
                }
                line.push(cell.ch);
            }
            line.push_str(&Sgr::Reset.to_string());
            lines.push(line);
        }
        lines.join("\n")
    }

    /// Convert into the page model.
    ///
    /// Lines are the display rows ordered by row number; a repeated row replaces the
    /// earlier one. Without a header, or with an address that is not a decimal page
    /// number, the page carries an error instead of lines.
    #[must_use]
    pub fn to_page(&self) -> Page {
        let mut page = Page::builder()
            .index(self.page_number().map_or(0, u32::from))
            .sub_index(self.sub_page().map_or(1, u32::from))
            .build();
        page.channel.clone_from(&self.channel);
        page.timestamp.clone_from(&self.timestamp);

        let Some(header) = self.header() else {
            page.error = Some("missing page header".to_string());
            return page;
        };
        if header.page_number().is_none() {
            page.error = Some(format!("invalid page address {:03x}", header.address));
            return page;
        }

        let mut display: BTreeMap<u8, &Row> = BTreeMap::new();
        for row in self.rows() {
            if row.address.row < DISPLAY_ROWS {
                display.insert(row.address.row, row);
            }
        }
        page.with_lines(display.values().map(|row| row.to_line()).collect())
    }
}
