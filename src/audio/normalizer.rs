use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, warn};

/// A transcoded mono 16 kHz WAV, deleted from disk when dropped, including
/// when a downstream pipeline stage fails.
pub struct NormalizedAudio {
    file: NamedTempFile,
}

impl NormalizedAudio {
    pub fn new(file: NamedTempFile) -> Self {
        Self { file }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Canonical-waveform production and duration probing.
#[async_trait]
pub trait AudioNormalizer: Send + Sync {
    /// Transcode an arbitrary container/codec to mono 16 kHz WAV.
    async fn normalize(&self, src: &Path) -> Result<NormalizedAudio>;

    /// Best-effort duration as "mm:ss"; empty string on any failure.
    async fn probe_duration(&self, src: &Path) -> String;
}

/// Thin wrapper around the ffmpeg/ffprobe binaries.
pub struct FfmpegNormalizer {
    ffmpeg: String,
    ffprobe: String,
}

impl FfmpegNormalizer {
    /// Verify the transcoder toolchain is runnable. A missing binary is a
    /// startup configuration error, never a per-request one.
    pub async fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Result<Self> {
        let normalizer = Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        };

        for tool in [&normalizer.ffmpeg, &normalizer.ffprobe] {
            let status = Command::new(tool)
                .arg("-version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await
                .with_context(|| format!("Failed to run {tool}"))?;
            if !status.success() {
                bail!("{tool} -version exited with {status}");
            }
        }

        Ok(normalizer)
    }

    async fn probe_seconds(&self, src: &Path) -> Result<f64> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(src)
            .output()
            .await
            .context("Failed to run ffprobe")?;

        if !output.status.success() {
            bail!(
                "ffprobe exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse::<f64>()
            .context("ffprobe printed a non-numeric duration")
    }
}

#[async_trait]
impl AudioNormalizer for FfmpegNormalizer {
    async fn normalize(&self, src: &Path) -> Result<NormalizedAudio> {
        let file = tempfile::Builder::new()
            .prefix("coach-waveform-")
            .suffix(".wav")
            .tempfile()
            .context("Failed to create temp WAV")?;

        let output = Command::new(&self.ffmpeg)
            .arg("-y")
            .arg("-i")
            .arg(src)
            .args(["-ac", "1", "-ar", "16000", "-f", "wav"])
            .arg(file.path())
            .output()
            .await
            .context("Failed to run ffmpeg")?;

        if !output.status.success() {
            bail!(
                "ffmpeg exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        debug!(
            "Normalized {} -> {}",
            src.display(),
            file.path().display()
        );

        Ok(NormalizedAudio::new(file))
    }

    async fn probe_duration(&self, src: &Path) -> String {
        match self.probe_seconds(src).await {
            Ok(seconds) => format_mm_ss(seconds),
            Err(e) => {
                warn!("Duration probe failed for {}: {e:#}", src.display());
                String::new()
            }
        }
    }
}

fn format_mm_ss(seconds: f64) -> String {
    let total = seconds.round().max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}
