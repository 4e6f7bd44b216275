//! Output directory lifecycle
//!
//! Every block run writes into a fresh `<root>/<block>_<YYYYmmdd_HHMMSS_mmm>`
//! directory, with a `_N` suffix if a run with the same timestamp exists.
//! Older runs of the same block beyond the configured number are removed
//! before the new directory is created.

use crate::HarnessError;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Subdirectory holding the binary data files
pub const DATA_DIR: &str = "test_data";

/// Whether `s` starts with a run timestamp, optionally followed by `_N`
fn is_run_stamp(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() < 19 {
        return false;
    }
    let stamp_ok = bytes[..19].iter().enumerate().all(|(i, b)| match i {
        8 | 15 => *b == b'_',
        _ => b.is_ascii_digit(),
    });
    if !stamp_ok {
        return false;
    }
    let suffix = &bytes[19..];
    suffix.is_empty() || (suffix.len() > 1 && suffix[0] == b'_' && suffix[1..].iter().all(u8::is_ascii_digit))
}

/// Earlier run directories of a block, oldest first
pub fn previous_runs(root: &Path, block: &str) -> Result<Vec<PathBuf>, HarnessError> {
    if !root.exists() {
        return Ok(Vec::new());
    }
    let prefix = format!("{}_", block);
    let mut runs: Vec<PathBuf> = fs::read_dir(root)
        .map_err(|e| HarnessError::io(root, e))?
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_dir())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .and_then(|name| name.strip_prefix(&prefix))
                .map(is_run_stamp)
                .unwrap_or(false)
        })
        .map(|entry| entry.path())
        .collect();
    runs.sort();
    Ok(runs)
}

/// Remove all but the `keep` most recent runs of a block
pub fn prune_stale_runs(root: &Path, block: &str, keep: usize) -> Result<Vec<PathBuf>, HarnessError> {
    let runs = previous_runs(root, block)?;
    let nof_stale = runs.len().saturating_sub(keep);
    let stale: Vec<PathBuf> = runs.into_iter().take(nof_stale).collect();
    for dir in &stale {
        fs::remove_dir_all(dir).map_err(|e| HarnessError::io(dir, e))?;
        debug!("Removed stale run {}", dir.display());
    }
    Ok(stale)
}

/// Output directory of one block run
#[derive(Debug, Clone)]
pub struct OutputDirectory {
    path: PathBuf,
    block: String,
}

impl OutputDirectory {
    /// Prune stale runs and create a fresh timestamped directory
    pub fn create(root: &Path, block: &str, keep_previous_runs: usize) -> Result<Self, HarnessError> {
        let pruned = prune_stale_runs(root, block, keep_previous_runs)?;
        if !pruned.is_empty() {
            info!("Pruned {} previous runs of {}", pruned.len(), block);
        }

        let stamp = Local::now().format("%Y%m%d_%H%M%S_%3f").to_string();
        let base = format!("{}_{}", block, stamp);
        let mut path = root.join(&base);
        let mut attempt = 1;
        while path.exists() {
            attempt += 1;
            path = root.join(format!("{}_{}", base, attempt));
        }

        let data_dir = path.join(DATA_DIR);
        fs::create_dir_all(&data_dir).map_err(|e| HarnessError::io(&data_dir, e))?;
        debug!("Created output directory {}", path.display());

        Ok(Self { path, block: block.to_string() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name of a data file, `<block>_test_<role><id>.dat`
    pub fn data_file_name(block: &str, role: &str, test_id: u32) -> String {
        format!("{}_test_{}{}.dat", block, role, test_id)
    }

    /// Absolute path of a data file and the path the header refers to it by
    pub fn data_file(&self, role: &str, test_id: u32) -> (PathBuf, String) {
        let name = Self::data_file_name(&self.block, role, test_id);
        (self.path.join(DATA_DIR).join(&name), format!("{}/{}", DATA_DIR, name))
    }

    /// Path of the run manifest
    pub fn manifest_path(&self) -> PathBuf {
        self.path.join(format!("{}_manifest.json", self.block))
    }
}

/// Parameters and data files of one written case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestCase {
    pub test_id: u32,
    pub parameters: Vec<(String, String)>,
    pub files: Vec<String>,
}

/// Summary of one block run, written next to the header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub block: String,
    pub category: String,
    pub seed: u64,
    pub generated_at: String,
    pub nof_written: usize,
    pub nof_skipped: usize,
    pub cases: Vec<ManifestCase>,
}

impl RunManifest {
    pub fn new(block: &str, category: &str, seed: u64) -> Self {
        Self {
            block: block.to_string(),
            category: category.to_string(),
            seed,
            generated_at: Local::now().to_rfc3339(),
            nof_written: 0,
            nof_skipped: 0,
            cases: Vec::new(),
        }
    }

    pub fn add_case(&mut self, case: ManifestCase) {
        self.cases.push(case);
        self.nof_written = self.cases.len();
    }

    pub fn write(&self, path: &Path) -> Result<(), HarnessError> {
        let file = fs::File::create(path).map_err(|e| HarnessError::io(path, e))?;
        serde_json::to_writer_pretty(file, self).map_err(|e| HarnessError::Interface(e.into()))
    }

    pub fn read(path: &Path) -> Result<Self, HarnessError> {
        let text = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| HarnessError::Interface(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_run_stamp_format() {
        assert!(is_run_stamp("20261019_101500_123"));
        assert!(is_run_stamp("20261019_101500_123_2"));
        assert!(!is_run_stamp("20261019_101500_12"));
        assert!(!is_run_stamp("20261019_101500_123_"));
        assert!(!is_run_stamp("segmenter_20261019_101500_123"));
    }

    #[test]
    fn test_same_timestamp_runs_do_not_collide() {
        let root = TempDir::new().unwrap();
        let a = OutputDirectory::create(root.path(), "ldpc_segmenter", 10).unwrap();
        let b = OutputDirectory::create(root.path(), "ldpc_segmenter", 10).unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.path().join(DATA_DIR).is_dir());
        assert!(b.path().join(DATA_DIR).is_dir());
    }

    #[test]
    fn test_pruning_keeps_most_recent_runs_of_the_block() {
        let root = TempDir::new().unwrap();
        for name in [
            "pdcch_20260101_000000_000",
            "pdcch_20260102_000000_000",
            "pdcch_20260103_000000_000",
            "pdcch_candidates_ue_20260101_000000_000",
            "pdcch_notes",
        ] {
            fs::create_dir_all(root.path().join(name)).unwrap();
        }

        let removed = prune_stale_runs(root.path(), "pdcch", 1).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(root.path().join("pdcch_20260103_000000_000").exists());
        assert!(!root.path().join("pdcch_20260101_000000_000").exists());
        assert!(root.path().join("pdcch_candidates_ue_20260101_000000_000").exists());
        assert!(root.path().join("pdcch_notes").exists());
    }

    #[test]
    fn test_pruning_ignores_non_ascii_names() {
        let root = TempDir::new().unwrap();
        let stray = format!("blk_{}\u{e9}", "a".repeat(18));
        fs::create_dir_all(root.path().join(&stray)).unwrap();
        fs::create_dir_all(root.path().join("blk_20260101_000000_000")).unwrap();

        assert!(!is_run_stamp(&stray["blk_".len()..]));
        let removed = prune_stale_runs(root.path(), "blk", 0).unwrap();
        assert_eq!(removed, vec![root.path().join("blk_20260101_000000_000")]);
        assert!(root.path().join(&stray).exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_collision_suffix_keeps_non_utf8_root() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join(OsStr::from_bytes(b"out\xff"));
        let a = OutputDirectory::create(&root, "blk", 10).unwrap();
        let b = OutputDirectory::create(&root, "blk", 10).unwrap();
        assert_eq!(a.path().parent(), Some(root.as_path()));
        assert_eq!(b.path().parent(), Some(root.as_path()));
        assert_ne!(a.path(), b.path());
        assert!(b.path().is_dir());
    }

    #[test]
    fn test_data_file_naming() {
        let root = TempDir::new().unwrap();
        let out = OutputDirectory::create(root.path(), "pbch_dmrs", 0).unwrap();
        let (path, reference) = out.data_file("output", 12);
        assert_eq!(reference, "test_data/pbch_dmrs_test_output12.dat");
        assert_eq!(path, out.path().join("test_data").join("pbch_dmrs_test_output12.dat"));
    }

    #[test]
    fn test_manifest_round_trip() {
        let root = TempDir::new().unwrap();
        let mut manifest = RunManifest::new("block", "phy/upper", 3);
        manifest.add_case(ManifestCase {
            test_id: 0,
            parameters: vec![("tbs".to_string(), "96".to_string())],
            files: vec!["test_data/block_test_input0.dat".to_string()],
        });
        let path = root.path().join("m.json");
        manifest.write(&path).unwrap();
        assert_eq!(RunManifest::read(&path).unwrap(), manifest);
    }
}
