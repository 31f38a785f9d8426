//! Skips reprocessing a workbook whose content hash matches the previous run.
use crate::error::ReadingLogError;
use crate::error::ResultMessage;
use crate::options::Labels;
use crate::options::MissingColumnPolicy;
use crate::options::PipelineOptions;
use crate::pipeline;
use crate::pipeline::CanonicalTable;
use glob::Pattern;
use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use std::fs;
use std::fs::File;
use std::io;
use std::io::BufReader;
use std::path::Path;
use std::path::PathBuf;
use tracing::info;
use tracing::warn;

/// Hash record stored next to the processed workbook.
///
/// `options` fingerprints the pipeline options of the run; records written
/// without one never match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HashRecord {
    pub hash: String,
    #[serde(default)]
    pub options: String,
}

/// Everything in [`PipelineOptions`] that shapes the output.
#[derive(Serialize)]
struct OptionsKey<'a> {
    labels: &'a Labels,
    sheet_name_patterns: Option<Vec<&'a str>>,
    missing_columns: MissingColumnPolicy,
    metadata_window: usize,
}

/// Hex encoded SHA-256 of the options that influence the output.
pub fn options_fingerprint(options: &PipelineOptions) -> Result<String, ReadingLogError> {
    let key = OptionsKey {
        labels: &options.labels,
        sheet_name_patterns: options
            .sheet_name_patterns
            .as_ref()
            .map(|patterns| patterns.iter().map(Pattern::as_str).collect()),
        missing_columns: options.missing_columns,
        metadata_window: options.metadata_window,
    };
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(&key)?);
    Ok(hex::encode(hasher.finalize()))
}

/// Result of a cached run.
#[derive(Debug)]
pub enum CacheOutcome {
    /// The input was unchanged and the previous output was kept
    Reused { output: PathBuf },
    /// The pipeline ran and wrote a fresh output
    Processed { output: PathBuf, table: CanonicalTable },
}

impl CacheOutcome {
    pub fn output(&self) -> &Path {
        match self {
            Self::Reused { output } | Self::Processed { output, .. } => output,
        }
    }
}

/// Hex encoded SHA-256 of a file's bytes.
pub fn file_hash(path: &Path) -> Result<String, ReadingLogError> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Location of the hash record: `<output dir>/<input stem>_hash.json`.
pub fn hash_record_path(input: &Path, output: &Path) -> PathBuf {
    let stem = input.file_stem().map(|stem| stem.to_string_lossy()).unwrap_or_default();
    let file_name = format!("{stem}_hash.json");
    match output.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Stored record, if one exists and parses; unreadable records count as absent.
pub fn load_record(path: &Path) -> Option<HashRecord> {
    let text = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&text) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable hash record");
            None
        }
    }
}

pub fn save_record(path: &Path, record: &HashRecord) -> Result<(), ReadingLogError> {
    fs::write(path, serde_json::to_string(record)?)?;
    Ok(())
}

/// Runs the pipeline unless the input hash and the options fingerprint match
/// the stored record and the output still exists. `force` always reruns.
/// The record is refreshed after every successful run.
pub fn process_cached(
    input: &Path,
    output: Option<&Path>,
    options: &PipelineOptions,
    force: bool,
) -> Result<CacheOutcome, ReadingLogError> {
    let output = output.map(Path::to_path_buf).unwrap_or_else(|| pipeline::default_output_path(input));
    let record_path = hash_record_path(input, &output);
    let current = HashRecord {
        hash: file_hash(input).with_prefix(&format!("Failed to hash '{}'", input.display()))?,
        options: options_fingerprint(options)?,
    };

    if !force && output.exists() {
        if let Some(record) = load_record(&record_path) {
            if record == current {
                info!(input = %input.display(), output = %output.display(), "Input unchanged, reusing output");
                return Ok(CacheOutcome::Reused { output });
            }
        }
    }

    let table = pipeline::run(input, Some(&output), options)?;
    save_record(&record_path, &current)?;
    Ok(CacheOutcome::Processed { output, table })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_file_content() -> Result<(), ReadingLogError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("empty.xlsx");
        fs::write(&path, b"")?;
        assert_eq!(
            file_hash(&path)?,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        Ok(())
    }

    #[test]
    fn fingerprint_tracks_output_shaping_options() -> Result<(), ReadingLogError> {
        let default = options_fingerprint(&PipelineOptions::default())?;
        assert_eq!(default, options_fingerprint(&PipelineOptions::default())?);

        let filtered = PipelineOptions::default().with_sheet_patterns(&["4*"])?;
        assert_ne!(default, options_fingerprint(&filtered)?);

        let strict = PipelineOptions {
            missing_columns: MissingColumnPolicy::Fail,
            ..PipelineOptions::default()
        };
        assert_ne!(default, options_fingerprint(&strict)?);

        let mut relabelled = PipelineOptions::default();
        relabelled.labels.title = "Title".to_owned();
        assert_ne!(default, options_fingerprint(&relabelled)?);
        Ok(())
    }

    #[test]
    fn record_sits_next_to_output() {
        let path = hash_record_path(Path::new("in/log.xlsx"), Path::new("output/log_processed.xlsx"));
        assert_eq!(path, Path::new("output").join("log_hash.json"));
    }

    #[test]
    fn records_round_trip_and_tolerate_garbage() -> Result<(), ReadingLogError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("log_hash.json");
        assert_eq!(load_record(&path), None);

        let record = HashRecord {
            hash: "abc".to_owned(),
            options: "def".to_owned(),
        };
        save_record(&path, &record)?;
        assert_eq!(fs::read_to_string(&path)?, r#"{"hash":"abc","options":"def"}"#);
        assert_eq!(load_record(&path), Some(record));

        fs::write(&path, r#"{"hash":"abc"}"#)?;
        assert_eq!(load_record(&path).map(|record| record.options), Some(String::new()));

        fs::write(&path, "not json")?;
        assert_eq!(load_record(&path), None);
        Ok(())
    }
}
