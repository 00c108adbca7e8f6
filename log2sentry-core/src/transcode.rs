//! Per-line transcoding: every non-blank line of a staged file becomes one
//! data file holding the base64 text of the zlib-compressed line bytes.
//!
//! Lines are compressed exactly as read, terminator included. Blank lines
//! (empty after trailing whitespace is stripped) produce nothing, but still
//! count towards the 1-based line numbers used in output names.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};
use serde::Serialize;
use tracing::debug;

use crate::error::PrepareError;
use crate::header::HeaderWriter;
use crate::plan::PathSet;

/// One non-blank line, with its 1-based position in the original file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub line_number: usize,
    pub raw: Vec<u8>,
}

/// Artifacts written for one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitArtifacts {
    pub line_number: usize,
    pub data_file: PathBuf,
    pub header_file: PathBuf,
}

/// Iterator over the non-blank lines of a reader.
pub struct Units<R> {
    reader: R,
    line_number: usize,
}

impl<R: BufRead> Units<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
        }
    }
}

impl<R: BufRead> Iterator for Units<R> {
    type Item = io::Result<Unit>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut raw = Vec::new();
            match self.reader.read_until(b'\n', &mut raw) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_number += 1;
                    if raw.trim_ascii_end().is_empty() {
                        continue;
                    }
                    return Some(Ok(Unit {
                        line_number: self.line_number,
                        raw,
                    }));
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// zlib-compresses `raw` and returns it as standard base64.
pub fn encode_unit(raw: &[u8]) -> io::Result<String> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(raw)?;
    let compressed = encoder.finish()?;
    Ok(BASE64.encode(compressed))
}

/// Reverses [`encode_unit`].
pub fn decode_unit(encoded: &str) -> io::Result<Vec<u8>> {
    let compressed = BASE64
        .decode(encoded.trim())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let mut decoder = ZlibDecoder::new(compressed.as_slice());
    let mut raw = Vec::new();
    decoder.read_to_end(&mut raw)?;
    Ok(raw)
}

/// Transcodes `paths.staged_file` into the staging work directory, writing
/// one data file and one header file per non-blank line.
pub fn transcode_file(
    paths: &PathSet,
    headers: &HeaderWriter,
) -> Result<Vec<UnitArtifacts>, PrepareError> {
    let staged = &paths.staged_file;
    let file = File::open(staged).map_err(|source| PrepareError::Read {
        path: staged.clone(),
        source,
    })?;

    let mut artifacts = Vec::new();
    for unit in Units::new(BufReader::new(file)) {
        let unit = unit.map_err(|source| PrepareError::Read {
            path: staged.clone(),
            source,
        })?;
        artifacts.push(write_unit(&unit, paths, headers)?);
    }
    Ok(artifacts)
}

fn write_unit(
    unit: &Unit,
    paths: &PathSet,
    headers: &HeaderWriter,
) -> Result<UnitArtifacts, PrepareError> {
    let encoded = encode_unit(&unit.raw).map_err(|source| PrepareError::Compress {
        path: paths.staged_file.clone(),
        line: unit.line_number,
        source,
    })?;

    let data_file = paths.unit_path(unit.line_number);
    fs::write(&data_file, encoded.as_bytes()).map_err(|source| PrepareError::Write {
        path: data_file.clone(),
        source,
    })?;
    let header_file = headers
        .write_for(&data_file)
        .map_err(|source| PrepareError::Write {
            path: data_file.clone(),
            source,
        })?;

    debug!(line = unit.line_number, data_file = %data_file.display(), "Wrote unit");
    Ok(UnitArtifacts {
        line_number: unit.line_number,
        data_file,
        header_file,
    })
}

/// True when `path` names a file this tool prepares.
pub fn is_json_log(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}
