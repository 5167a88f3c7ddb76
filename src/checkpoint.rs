use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::stats::Metric;

/// Last line processed, one slot per metric mode so runs selecting different
/// metrics never clobber each other's position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub count: u64,
    pub rate: u64,
    pub errors: u64,
    pub latency: u64,
}

impl Checkpoint {
    /// Loads the checkpoint from `path`. A missing or unreadable status file
    /// is not an error: the scan simply restarts from line zero.
    pub fn load(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    warn!(%err, path = %path.display(), "cannot read status file, ignoring");
                }
                return Self::default();
            }
        };
        match serde_json::from_str(&text) {
            Ok(checkpoint) => checkpoint,
            Err(err) => {
                warn!(%err, path = %path.display(), "malformed status file, ignoring");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let file = fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn slot(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Count => self.count,
            Metric::Rate => self.rate,
            Metric::Errors => self.errors,
            Metric::Latency => self.latency,
        }
    }

    /// Updates the slot for `metric`, leaving the other slots unchanged so
    /// they round-trip through save untouched.
    pub fn set_slot(&mut self, metric: Metric, line: u64) {
        match metric {
            Metric::Count => self.count = line,
            Metric::Rate => self.rate = line,
            Metric::Errors => self.errors = line,
            Metric::Latency => self.latency = line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::path::PathBuf;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("weblog-metrics-{}-{name}.json", std::process::id()))
    }

    #[test]
    fn test_save_and_load_round_trip() -> Result<()> {
        let path = scratch_path("round-trip");
        let mut checkpoint = Checkpoint::default();
        checkpoint.set_slot(Metric::Errors, 120);
        checkpoint.set_slot(Metric::Count, 45);
        checkpoint.save(&path)?;

        let loaded = Checkpoint::load(&path);
        fs::remove_file(&path)?;
        assert_eq!(loaded, checkpoint);
        assert_eq!(loaded.slot(Metric::Errors), 120);
        assert_eq!(loaded.slot(Metric::Count), 45);
        assert_eq!(loaded.slot(Metric::Rate), 0);

        Ok(())
    }

    #[test]
    fn test_missing_file_loads_zeros() {
        let loaded = Checkpoint::load(Path::new("/nonexistent/weblog-metrics-status"));
        assert_eq!(loaded, Checkpoint::default());
    }

    #[test]
    fn test_malformed_file_loads_zeros() -> Result<()> {
        let path = scratch_path("malformed");
        fs::write(&path, "not json at all")?;
        let loaded = Checkpoint::load(&path);
        fs::remove_file(&path)?;
        assert_eq!(loaded, Checkpoint::default());
        Ok(())
    }

    #[test]
    fn test_set_slot_touches_only_one_slot() {
        let mut checkpoint = Checkpoint {
            count: 1,
            rate: 2,
            errors: 3,
            latency: 4,
        };
        checkpoint.set_slot(Metric::Latency, 40);
        assert_eq!(
            checkpoint,
            Checkpoint {
                count: 1,
                rate: 2,
                errors: 3,
                latency: 40,
            }
        );
    }
}
