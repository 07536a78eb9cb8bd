//! Input text decoding
//!
//! Source files may come from spreadsheet exports in a legacy encoding.
//! [`DecodingReader`] transcodes them to UTF-8 on the fly so the CSV parser
//! never needs the whole file in memory. Decoding is strict: malformed input
//! is reported as [`io::ErrorKind::InvalidData`] instead of being replaced.
//! The configured encoding is never second-guessed; a BOM belonging to some
//! other encoding is just more bytes to decode.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use encoding_rs::{Decoder, DecoderResult, Encoding, UTF_8};

use crate::error::{AnnoSortError, Result};

/// Default input encoding: UTF-8 with an optional leading BOM
pub const DEFAULT_INPUT_ENCODING: &str = "utf-8-sig";

const INPUT_CHUNK: usize = 8 * 1024;
const OUTPUT_CHUNK: usize = 16 * 1024;

/// A configured source encoding
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct InputEncoding {
    encoding: &'static Encoding,
}

impl InputEncoding {
    /// Resolve an encoding label such as `utf-8-sig`, `utf-8`, `gbk` or
    /// `windows-1252`.
    pub fn from_label(label: &str) -> Result<Self> {
        let normalized = label.trim().to_ascii_lowercase();
        let encoding = match normalized.as_str() {
            "utf-8-sig" | "utf8-sig" | "utf_8_sig" => Some(UTF_8),
            other => Encoding::for_label(other.as_bytes()),
        };
        encoding
            .map(|encoding| Self { encoding })
            .ok_or_else(|| AnnoSortError::UnknownEncoding {
                label: label.to_string(),
            })
    }

    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    /// Wrap a byte reader. A leading BOM of this encoding is consumed.
    pub fn reader<R: Read>(&self, inner: R) -> DecodingReader<R> {
        DecodingReader::new(inner, self.encoding)
    }

    pub fn open(&self, path: &Path) -> io::Result<DecodingReader<File>> {
        Ok(self.reader(File::open(path)?))
    }
}

impl Default for InputEncoding {
    fn default() -> Self {
        Self { encoding: UTF_8 }
    }
}

impl fmt::Debug for InputEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InputEncoding").field(&self.name()).finish()
    }
}

impl fmt::Display for InputEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Streaming, strict transcoder to UTF-8
pub struct DecodingReader<R> {
    inner: R,
    decoder: Decoder,
    input: Vec<u8>,
    in_pos: usize,
    in_len: usize,
    output: Vec<u8>,
    out_pos: usize,
    out_len: usize,
    consumed: u64,
    malformed_at: Option<u64>,
    eof: bool,
    done: bool,
}

impl<R: Read> DecodingReader<R> {
    fn new(inner: R, encoding: &'static Encoding) -> Self {
        Self {
            inner,
            decoder: encoding.new_decoder_with_bom_removal(),
            input: vec![0; INPUT_CHUNK],
            in_pos: 0,
            in_len: 0,
            output: vec![0; OUTPUT_CHUNK],
            out_pos: 0,
            out_len: 0,
            consumed: 0,
            malformed_at: None,
            eof: false,
            done: false,
        }
    }

    fn fill_input(&mut self) -> io::Result<()> {
        loop {
            match self.inner.read(&mut self.input) {
                Ok(n) => {
                    self.in_pos = 0;
                    self.in_len = n;
                    self.eof = n == 0;
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn decode_chunk(&mut self) -> io::Result<()> {
        if self.in_pos == self.in_len && !self.eof {
            self.fill_input()?;
        }

        let (result, read, written) = self.decoder.decode_to_utf8_without_replacement(
            &self.input[self.in_pos..self.in_len],
            &mut self.output,
            self.eof,
        );
        self.in_pos += read;
        self.consumed += read as u64;
        self.out_pos = 0;
        self.out_len = written;

        match result {
            DecoderResult::InputEmpty => {
                if self.eof {
                    self.done = true;
                }
                Ok(())
            }
            DecoderResult::OutputFull => Ok(()),
            DecoderResult::Malformed(_, _) => {
                // Hand out what was decoded before the bad sequence first.
                self.malformed_at = Some(self.consumed);
                Ok(())
            }
        }
    }

    fn malformed_error(&self, offset: u64) -> io::Error {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "malformed {} input near byte {}",
                self.decoder.encoding().name(),
                offset
            ),
        )
    }
}

impl<R: Read> Read for DecodingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if self.out_pos < self.out_len {
                let n = (self.out_len - self.out_pos).min(buf.len());
                buf[..n].copy_from_slice(&self.output[self.out_pos..self.out_pos + n]);
                self.out_pos += n;
                return Ok(n);
            }
            if let Some(offset) = self.malformed_at {
                return Err(self.malformed_error(offset));
            }
            if self.done {
                return Ok(0);
            }
            self.decode_chunk()?;
        }
    }
}
