//! Sample length lookup from WAV files on disk.

use std::path::{Path, PathBuf};

use hound::WavReader;
use partita_migrate::{MigrationError, SampleResolver};
use tracing::debug;

/// Resolves stored media paths to WAV files and reads their length.
///
/// A stored path is tried as-is first. If a media directory is set, the
/// path relative to it and then the bare file name inside it are tried too,
/// so projects moved between machines still find their samples.
#[derive(Debug, Clone, Default)]
pub struct WavSampleResolver {
    media_dir: Option<PathBuf>,
}

impl WavSampleResolver {
    /// Resolver that also searches `media_dir`.
    pub fn new(media_dir: Option<PathBuf>) -> Self {
        Self { media_dir }
    }

    fn locate(&self, stored: &str) -> Option<PathBuf> {
        let direct = PathBuf::from(stored);
        if direct.is_file() {
            return Some(direct);
        }
        let dir = self.media_dir.as_deref()?;
        let relative = dir.join(stored.trim_start_matches(['/', '\\']));
        if relative.is_file() {
            return Some(relative);
        }
        let name = Path::new(stored).file_name()?;
        let flat = dir.join(name);
        flat.is_file().then_some(flat)
    }
}

/// Length of a WAV file in seconds.
pub fn wav_duration(path: &Path) -> Result<f32, hound::Error> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let frames = reader.duration();
    Ok((f64::from(frames) / f64::from(spec.sample_rate)) as f32)
}

impl SampleResolver for WavSampleResolver {
    fn duration(&self, path: &str) -> Result<f32, MigrationError> {
        let found = self
            .locate(path)
            .ok_or_else(|| MigrationError::unavailable(path, "file not found"))?;
        let seconds = wav_duration(&found).map_err(|e| MigrationError::unavailable(path, e.to_string()))?;
        debug!("{path}: {seconds:.3}s from {}", found.display());
        Ok(seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};
    use tempfile::TempDir;

    fn write_wav(path: &Path, frames: u32, sample_rate: u32) {
        let spec = WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for _ in 0..frames * 2 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn reads_length_in_seconds() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("half.wav");
        write_wav(&path, 22_050, 44_100);
        let resolver = WavSampleResolver::default();
        let seconds = resolver.duration(path.to_str().unwrap()).unwrap();
        assert!((seconds - 0.5).abs() < 1e-6);
    }

    #[test]
    fn falls_back_to_media_dir() {
        let temp = TempDir::new().unwrap();
        write_wav(&temp.path().join("kick.wav"), 4_800, 48_000);
        let resolver = WavSampleResolver::new(Some(temp.path().to_path_buf()));
        let seconds = resolver.duration("/old/machine/samples/kick.wav").unwrap();
        assert!((seconds - 0.1).abs() < 1e-6);
    }

    #[test]
    fn missing_file_is_unavailable() {
        let resolver = WavSampleResolver::default();
        assert!(matches!(
            resolver.duration("/nowhere/gone.wav"),
            Err(MigrationError::ResourceUnavailable { .. })
        ));
    }

    #[test]
    fn non_wav_is_unavailable() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.wav");
        std::fs::write(&path, b"not audio").unwrap();
        let resolver = WavSampleResolver::default();
        assert!(resolver.duration(path.to_str().unwrap()).is_err());
    }
}
