//! Builds a cassette from live interactions and writes it on finish.

use std::path::PathBuf;

use chrono::Utc;

use super::format::{Cassette, Interaction};

/// Accumulates a cassette in memory until `finish` writes it as YAML.
#[derive(Debug)]
pub struct CassetteRecorder {
    path: PathBuf,
    cassette: Cassette,
}

impl CassetteRecorder {
    /// Start an empty cassette destined for `path`.
    pub fn new(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        commit: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            cassette: Cassette {
                name: name.into(),
                recorded_at: Utc::now(),
                commit: commit.into(),
                interactions: Vec::new(),
            },
        }
    }

    /// Append one port call.
    ///
    /// Both ports share the sequence, so replay sees the describe call before
    /// the generate call it fed.
    pub fn record(
        &mut self,
        port: &str,
        method: &str,
        input: serde_json::Value,
        output: serde_json::Value,
    ) {
        let seq = self.cassette.interactions.len() as u64;
        self.cassette.interactions.push(Interaction {
            seq,
            port: port.to_string(),
            method: method.to_string(),
            input,
            output,
        });
    }

    /// Write the cassette, creating parent directories, and return its path.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if serialization or the write fails.
    pub fn finish(self) -> std::io::Result<PathBuf> {
        let Self { path, cassette } = self;
        let yaml = serde_yaml::to_string(&cassette).map_err(std::io::Error::other)?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&path, yaml)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn describe_then_generate_share_one_sequence() {
        let dir = std::env::temp_dir().join("reimagine_cassette_recorder_test");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("nested").join("pipeline.cassette.yaml");

        let mut recorder = CassetteRecorder::new(&path, "test-recording", "deadbeef");
        recorder.record(
            "prompt_describer",
            "describe",
            json!({"instruction": "make the sky purple"}),
            json!({"Ok": "A red bicycle on a beach under a purple sky"}),
        );
        recorder.record(
            "image_generator",
            "generate",
            json!({"prompt": "A red bicycle on a beach under a purple sky"}),
            json!({"Err": "quota exceeded"}),
        );

        assert_eq!(recorder.finish().unwrap(), path);

        let cassette: Cassette =
            serde_yaml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(cassette.name, "test-recording");
        assert_eq!(cassette.commit, "deadbeef");
        let order: Vec<(u64, &str)> =
            cassette.interactions.iter().map(|i| (i.seq, i.port.as_str())).collect();
        assert_eq!(order, [(0, "prompt_describer"), (1, "image_generator")]);
        assert_eq!(cassette.interactions[1].output, json!({"Err": "quota exceeded"}));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_recording_still_writes_a_cassette() {
        let dir = std::env::temp_dir().join("reimagine_cassette_recorder_empty");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("pipeline.cassette.yaml");

        CassetteRecorder::new(&path, "empty", "unknown").finish().unwrap();

        let cassette: Cassette =
            serde_yaml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(cassette.interactions.is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
