//! Save functionality for built collation data.

use super::format::{SerializedData, FORMAT_VERSION};
use super::DATA_FILE_NAME;
use kollate_core::{CollationData, CollationError, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// Collation data saver.
pub struct DataSaver<'a> {
    data: &'a CollationData,
}

impl<'a> DataSaver<'a> {
    /// Create a new saver for `data`.
    pub fn new(data: &'a CollationData) -> Self {
        Self { data }
    }

    /// Save the data to a directory.
    ///
    /// This writes a single `collation.json` file.
    ///
    /// # Arguments
    /// * `path` - Directory path to save to
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path).map_err(|e| {
            CollationError::Save(format!(
                "Failed to create directory {}: {}",
                path.display(),
                e
            ))
        })?;

        let file_path = path.join(DATA_FILE_NAME);
        let file = File::create(&file_path).map_err(|e| {
            CollationError::Save(format!(
                "Failed to create file {}: {}",
                file_path.display(),
                e
            ))
        })?;

        let writer = BufWriter::new(file);
        let serialized = self.serialize()?;
        serde_json::to_writer(writer, &serialized)
            .map_err(|e| CollationError::Save(format!("Failed to serialize data: {}", e)))?;
        debug!(path = %file_path.display(), "saved collation data");

        Ok(())
    }

    /// Convert to the serialization format.
    pub fn serialize(&self) -> Result<SerializedData> {
        let data = self.data;
        Ok(SerializedData {
            version: FORMAT_VERSION.to_string(),
            trie: data.trie().to_bytes(),
            ce32s: data.ce32s().to_vec(),
            ces: data.ces().iter().map(|ce| ce.to_bits()).collect(),
            contexts: data.contexts().to_vec(),
            unsafe_backward: data.unsafe_backward().to_units()?,
            jamo_ces: data
                .jamo_ces()
                .map(|table| table.iter().map(|ce| ce.to_bits()).collect()),
            lead_surrogates: data.lead_surrogates().iter().map(|&kind| kind as u8).collect(),
        })
    }
}
