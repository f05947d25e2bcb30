//! Load functionality for saved collation data.

use super::format::{SerializedData, FORMAT_VERSION};
use super::DATA_FILE_NAME;
use kollate_core::hangul::JAMO_CE_COUNT;
use kollate_core::{
    Ce, CodePointSet, CodePointTrie, CollationData, CollationError, LeadSurrogateKind, Result,
    LEAD_SURROGATE_COUNT,
};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

/// Collation data loader.
pub struct DataLoader;

impl DataLoader {
    /// Load collation data from a directory.
    ///
    /// Expects a `collation.json` file in the given directory.
    ///
    /// # Arguments
    /// * `path` - Directory path to load from
    pub fn load(path: &Path) -> Result<CollationData> {
        let file_path = path.join(DATA_FILE_NAME);
        let file = File::open(&file_path).map_err(|e| {
            CollationError::Load(format!(
                "Failed to open file {}: {}",
                file_path.display(),
                e
            ))
        })?;

        let reader = BufReader::new(file);
        let serialized: SerializedData = serde_json::from_reader(reader)
            .map_err(|e| CollationError::Load(format!("Failed to deserialize data: {}", e)))?;

        Self::deserialize(serialized)
    }

    /// Rebuild collation data from the serialization format.
    pub fn deserialize(data: SerializedData) -> Result<CollationData> {
        if data.version != FORMAT_VERSION {
            return Err(CollationError::Load(format!(
                "Unsupported format version {} (expected {})",
                data.version, FORMAT_VERSION
            )));
        }

        let trie = CodePointTrie::from_bytes(&data.trie)?;
        let unsafe_backward = CodePointSet::from_units(&data.unsafe_backward)?;
        let jamo_ces = match data.jamo_ces {
            Some(table) if table.len() != JAMO_CE_COUNT => {
                return Err(CollationError::Load(format!(
                    "Jamo table has {} entries (expected {})",
                    table.len(),
                    JAMO_CE_COUNT
                )));
            }
            Some(table) => Some(table.into_iter().map(Ce::from_bits).collect()),
            None => None,
        };
        if !data.lead_surrogates.is_empty() && data.lead_surrogates.len() != LEAD_SURROGATE_COUNT {
            return Err(CollationError::Load(format!(
                "Lead surrogate table has {} entries (expected {})",
                data.lead_surrogates.len(),
                LEAD_SURROGATE_COUNT
            )));
        }
        let lead_surrogates = data
            .lead_surrogates
            .into_iter()
            .map(|kind| {
                LeadSurrogateKind::try_from(kind).map_err(|kind| {
                    CollationError::Load(format!("Invalid lead surrogate summary {}", kind))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CollationData::new(
            Arc::new(trie),
            data.ce32s,
            data.ces.into_iter().map(Ce::from_bits).collect(),
            data.contexts,
            unsafe_backward,
            jamo_ces,
        )
        .with_lead_surrogates(lead_surrogates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::DataSaver;
    use crate::CollationDataBuilder;

    fn sample() -> CollationData {
        let mut builder = CollationDataBuilder::new();
        builder.add("", "a", &[Ce::from_primary(0x1000)]).unwrap();
        builder.add("", "ab", &[Ce::from_primary(0x2000)]).unwrap();
        builder
            .add("", "c", &[Ce::from_primary(0x1100), Ce::new(0x4000_0000, 0x21, 0x02)])
            .unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let data = sample();
        let dir = tempfile::tempdir().unwrap();
        DataSaver::new(&data).save(dir.path()).unwrap();
        let loaded = DataLoader::load(dir.path()).unwrap();

        assert_eq!(loaded, data);
        assert_eq!(loaded.lookup("", "abc"), data.lookup("", "abc"));
    }

    #[test]
    fn test_version_mismatch() {
        let mut serialized = DataSaver::new(&sample()).serialize().unwrap();
        serialized.version = "0.1.0".to_string();
        assert!(matches!(
            DataLoader::deserialize(serialized),
            Err(CollationError::Load(_))
        ));
    }

    #[test]
    fn test_lead_surrogates_round_trip() {
        let data = sample();
        let serialized = DataSaver::new(&data).serialize().unwrap();
        assert_eq!(serialized.lead_surrogates.len(), LEAD_SURROGATE_COUNT);
        let loaded = DataLoader::deserialize(serialized.clone()).unwrap();
        assert_eq!(loaded.lead_surrogates(), data.lead_surrogates());

        let mut bad = serialized;
        bad.lead_surrogates[0] = 7;
        assert!(matches!(
            DataLoader::deserialize(bad),
            Err(CollationError::Load(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            DataLoader::load(dir.path()),
            Err(CollationError::Load(_))
        ));
    }
}
