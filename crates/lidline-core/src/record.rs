//! Batch-wide eyelid coordinate record.

use crate::types::EyelidCurve;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("failed to write record {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Curves of every processed image, one entry per image on each side.
///
/// Both lists grow together so that index `i` refers to the same image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EyelidRecord {
    pub left_eye: Vec<Vec<EyelidCurve>>,
    pub right_eye: Vec<Vec<EyelidCurve>>,
}

impl EyelidRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one image's curves.
    pub fn push(&mut self, left: Vec<EyelidCurve>, right: Vec<EyelidCurve>) {
        self.left_eye.push(left);
        self.right_eye.push(right);
    }

    /// Number of images recorded.
    pub fn len(&self) -> usize {
        self.left_eye.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left_eye.is_empty()
    }

    /// Serialize as 4-space indented JSON.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), RecordError> {
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(writer, formatter);
        self.serialize(&mut ser)?;
        Ok(())
    }

    /// Write the record to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<(), RecordError> {
        let io_err = |source| RecordError::Io {
            path: path.display().to_string(),
            source,
        };
        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        self.to_writer(&mut writer)?;
        writer.flush().map_err(io_err)?;
        Ok(())
    }
}
