use std::io::Write;

use serde::Serialize;

use crate::StageError;

/// Serialises values as newline-delimited JSON.
///
/// Each call to [`write`](Self::write) produces exactly one
/// newline-terminated JSON object.
pub struct NdjsonWriter<W: Write> {
    inner: W,
    lines: usize,
}

impl<W: Write> NdjsonWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, lines: 0 }
    }

    /// Serialise `value` as a single JSON line.
    pub fn write<T: Serialize>(&mut self, value: &T) -> Result<(), StageError> {
        let mut line = serde_json::to_vec(value)?;
        line.push(b'\n');
        self.inner.write_all(&line).map_err(StageError::Write)?;
        self.lines += 1;
        Ok(())
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Flush and return the underlying writer.
    pub fn finish(mut self) -> Result<W, StageError> {
        self.inner.flush().map_err(StageError::Write)?;
        Ok(self.inner)
    }
}

/// Encode `values` as one JSON object per line.
pub fn to_ndjson<T: Serialize>(values: &[T]) -> Result<Vec<u8>, StageError> {
    let mut writer = NdjsonWriter::new(Vec::new());
    for value in values {
        writer.write(value)?;
    }
    writer.finish()
}
