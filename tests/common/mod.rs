use std::path::PathBuf;

use teletext::hamming::encode_nibble;
use tracing_subscriber::EnvFilter;

/// Log to the test output, filtered by `RUST_LOG`.
#[allow(dead_code)]
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[allow(dead_code)]
pub fn fixture_path(name: &str) -> PathBuf {
    let mut path =
        PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set"));
    path.push("tests/fixtures");
    path.push(name);
    path
}

fn packet(magazine: u8, row: u8, header: &[u8], text: &[u8]) -> Vec<u8> {
    let mpag = (row << 3) | (magazine & 7);
    let mut buf = vec![encode_nibble(mpag), encode_nibble(mpag >> 4)];
    buf.extend_from_slice(header);
    buf.extend_from_slice(text);
    buf.resize(42, 0x20);
    buf
}

/// Row 0 packet for page `mag`/`page` with sub-page 1 in the given language.
#[allow(dead_code)]
pub fn header_packet(magazine: u8, page: u8, language: u8, text: &[u8]) -> Vec<u8> {
    let control = language << 4;
    let header = [
        encode_nibble(page),
        encode_nibble(page >> 4),
        encode_nibble(1),
        encode_nibble(0),
        encode_nibble(0),
        encode_nibble(0),
        encode_nibble(control),
        encode_nibble(control >> 4),
    ];
    packet(magazine, 0, &header, text)
}

#[allow(dead_code)]
pub fn row_packet(magazine: u8, row: u8, text: &[u8]) -> Vec<u8> {
    packet(magazine, row, &[], text)
}
