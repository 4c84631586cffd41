use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::path::Path;
use tracing::{debug, trace, warn};

use crate::errors::{ScanError, ScanResult};

/// Files at or above this size are memory mapped instead of read into a buffer
pub(crate) const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024; // 10MB

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Candidate encodings, tried in this order.
///
/// Latin-1 must stay last: it accepts any byte sequence, so a candidate after
/// it would never be tried.
pub const DEFAULT_ENCODINGS: &[TextEncoding] = &[
    TextEncoding::Utf8Sig,
    TextEncoding::Utf16,
    TextEncoding::Windows1252,
    TextEncoding::Latin1,
];

/// Windows-1252 mappings for 0x80..=0x9F; `None` marks the five undefined bytes
const CP1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'),
    None,
    Some('\u{201A}'),
    Some('\u{0192}'),
    Some('\u{201E}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02C6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017D}'),
    None,
    None,
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201C}'),
    Some('\u{201D}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02DC}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203A}'),
    Some('\u{0153}'),
    None,
    Some('\u{017E}'),
    Some('\u{0178}'),
];

/// A text encoding the reader knows how to try
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextEncoding {
    /// UTF-8, with an optional byte-order mark
    #[serde(rename = "utf-8-sig")]
    Utf8Sig,
    /// UTF-16, endianness from the byte-order mark, little endian without one
    #[serde(rename = "utf-16")]
    Utf16,
    /// Windows code page 1252
    #[serde(rename = "cp1252")]
    Windows1252,
    /// ISO-8859-1; every byte is a code point, so it never fails
    #[serde(rename = "latin-1")]
    Latin1,
}

impl TextEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8Sig => "utf-8-sig",
            TextEncoding::Utf16 => "utf-16",
            TextEncoding::Windows1252 => "cp1252",
            TextEncoding::Latin1 => "latin-1",
        }
    }

    /// Decodes the whole buffer, or `None` if the bytes are not valid in this encoding
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8Sig => {
                let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                std::str::from_utf8(body).ok().map(str::to_owned)
            }
            TextEncoding::Utf16 => decode_utf16(bytes),
            TextEncoding::Windows1252 => bytes
                .iter()
                .map(|&b| match b {
                    0x80..=0x9F => CP1252_HIGH[(b - 0x80) as usize],
                    _ => Some(b as char),
                })
                .collect(),
            TextEncoding::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn decode_utf16(bytes: &[u8]) -> Option<String> {
    let (body, big_endian) = if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
        (rest, false)
    } else if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        (rest, true)
    } else {
        (bytes, false)
    };

    if body.len() % 2 != 0 {
        return None;
    }

    let units = body.chunks_exact(2).map(|pair| {
        if big_endian {
            u16::from_be_bytes([pair[0], pair[1]])
        } else {
            u16::from_le_bytes([pair[0], pair[1]])
        }
    });

    char::decode_utf16(units).collect::<Result<String, _>>().ok()
}

/// Splits text into lines on `\n`, `\r\n` or a lone `\r`, without terminators
pub fn split_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        match rest.find(['\n', '\r']) {
            Some(pos) => {
                lines.push(rest[..pos].to_string());
                let skip = if rest[pos..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[pos + skip..];
            }
            None => {
                lines.push(rest.to_string());
                break;
            }
        }
    }
    lines
}

/// Heuristic for "decoded with the wrong encoding": a NUL in the first line.
///
/// UTF-16 text without a byte-order mark is valid UTF-8 (every other byte is
/// zero), and this is what rejects it.
pub fn looks_binary(lines: &[String]) -> bool {
    lines.first().is_some_and(|line| line.contains('\0'))
}

/// The lines of a file together with the encoding that produced them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub encoding: TextEncoding,
    pub lines: Vec<String>,
}

/// Reads files as lines of text, trying candidate encodings in priority order
#[derive(Debug, Clone)]
pub struct EncodingReader {
    candidates: Vec<TextEncoding>,
}

impl Default for EncodingReader {
    fn default() -> Self {
        Self::new(DEFAULT_ENCODINGS.to_vec())
    }
}

impl EncodingReader {
    /// Creates a reader with an explicit candidate list
    pub fn new(candidates: Vec<TextEncoding>) -> Self {
        Self { candidates }
    }

    pub fn candidates(&self) -> &[TextEncoding] {
        &self.candidates
    }

    /// Decodes `bytes` with the first candidate that succeeds and does not look binary
    pub fn decode(&self, bytes: &[u8], path: &Path) -> ScanResult<DecodedText> {
        for &encoding in &self.candidates {
            let Some(text) = encoding.decode(bytes) else {
                trace!("{} is not valid {}", path.display(), encoding);
                continue;
            };

            let lines = split_lines(&text);
            if looks_binary(&lines) {
                trace!("{} looks binary as {}", path.display(), encoding);
                continue;
            }

            debug!("Decoded {} as {}", path.display(), encoding);
            return Ok(DecodedText { encoding, lines });
        }

        Err(ScanError::encoding_exhausted(path))
    }

    /// Reads and decodes a file, memory mapping it when it is large
    pub fn read_file(&self, path: &Path) -> ScanResult<DecodedText> {
        let file = File::open(path).map_err(|e| ScanError::from_io(path, e))?;
        let size = file.metadata().map(|m| m.len()).unwrap_or(0);

        if size >= LARGE_FILE_THRESHOLD {
            trace!("Memory mapping {}", path.display());
            let mmap = unsafe { Mmap::map(&file) }.map_err(ScanError::IoError)?;
            self.decode(&mmap, path)
        } else {
            let bytes = std::fs::read(path).map_err(|e| ScanError::from_io(path, e))?;
            self.decode(&bytes, path)
        }
    }

    /// Reads and decodes a file, logging a warning and returning `None` on failure
    pub fn read_or_skip(&self, path: &Path) -> Option<DecodedText> {
        match self.read_file(path) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Returns the file's lines, or nothing if it cannot be read or decoded.
    ///
    /// Failures are logged rather than returned; the file simply contributes
    /// no records.
    pub fn read_lines(&self, path: &Path) -> Vec<String> {
        self.read_or_skip(path)
            .map(|decoded| decoded.lines)
            .unwrap_or_default()
    }
}

/// Reads a file with the default candidate list
pub fn read_lines(path: &Path) -> Vec<String> {
    EncodingReader::default().read_lines(path)
}
