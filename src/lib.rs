//! Teletext decoding and page model.
//!
//! Raw 42 byte T42 packets are decoded by [t42] into rows of colored character cells,
//! which are assembled into [Page]s made of lines of attributed [Block]s. Pages of one
//! channel snapshot are held by a [Teletext] container, read from and written to a
//! line oriented JSON format (ndjson) and rendered for terminals as ANSI text.
//!
//! Packets captured by teletext_ng are read from their nested zip archives with
//! [archive::TeletextNg].
//!
//! References:
//! * ETSI EN 300 706 Enhanced Teletext specification
//!
//! ```
//! use teletext::{AnsiOptions, Teletext};
//!
//! let tt = Teletext::from_ndjson_str(r#"
//! {"page":100,"sub_page":1,"timestamp":"2023-01-01T00:00:00"}
//! [["wb","Hallo "],["yb",200,"Sport"]]
//! "#).unwrap();
//!
//! let page = tt.get_page(100, None).unwrap();
//! assert_eq!(page.to_ansi(&AnsiOptions::builder().colors(false).build()), "Hallo Sport\n");
//! ```
mod ansi;
mod error;

pub mod archive;
pub mod glyph;
pub mod hamming;
pub mod page;
pub mod t42;
pub mod teletext;

pub use error::{Error, Result};
pub use page::{AnsiOptions, Block, CharSet, Color, Line, Link, Page};
pub use t42::T42Page;
pub use teletext::{Direction, PageKey, Teletext};
