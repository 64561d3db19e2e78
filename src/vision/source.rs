//! Video frame sources
//!
//! Frames are decoded by an `ffmpeg` child process into packed RGB24 and read
//! from its stdout one frame at a time.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout, Command};

use crate::{Error, Result};

/// Bytes per pixel for packed RGB24
const RGB24_BYTES: usize = 3;

/// One decoded video frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// 1-based position of this frame in its video
    pub index: u64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Packed RGB24 pixel data, row-major
    pub pixels: Vec<u8>,
}

/// An opened video, yielding frames in order
#[async_trait]
pub trait FrameStream: Send {
    /// Frame rate reported by the container, if it reported a usable one
    fn fps(&self) -> Option<f64>;

    /// Read the next frame; `None` at end of stream
    async fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// Opens video files for reading
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Open a video
    ///
    /// # Errors
    ///
    /// Returns `Error::SourceUnavailable` if the video cannot be opened
    async fn open(&self, path: &Path) -> Result<Box<dyn FrameStream>>;
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
}

/// Video source backed by the `ffmpeg` and `ffprobe` executables
#[derive(Debug, Clone)]
pub struct FfmpegSource {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegSource {
    /// Locate `ffmpeg` and `ffprobe` on `PATH`
    ///
    /// # Errors
    ///
    /// Returns error if either executable is missing
    pub fn new() -> Result<Self> {
        let ffmpeg = which::which("ffmpeg")
            .map_err(|e| Error::Config(format!("ffmpeg not found on PATH: {e}")))?;
        let ffprobe = which::which("ffprobe")
            .map_err(|e| Error::Config(format!("ffprobe not found on PATH: {e}")))?;

        tracing::debug!(
            ffmpeg = %ffmpeg.display(),
            ffprobe = %ffprobe.display(),
            "video decoder located"
        );

        Ok(Self { ffmpeg, ffprobe })
    }

    /// Read width, height and frame rate of the first video stream
    async fn probe(&self, path: &Path) -> Result<(u32, u32, Option<f64>)> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height,avg_frame_rate,r_frame_rate",
                "-of",
                "json",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::SourceUnavailable(format!(
                "{}: {}",
                path.display(),
                stderr.trim()
            )));
        }

        let probe: ProbeOutput = serde_json::from_slice(&output.stdout)?;
        let stream = probe.streams.into_iter().next().ok_or_else(|| {
            Error::SourceUnavailable(format!("{}: no video stream", path.display()))
        })?;

        stream_geometry(path, &stream)
    }
}

/// Frame size and rate of a probed stream; zero or missing dimensions are unusable
fn stream_geometry(path: &Path, stream: &ProbeStream) -> Result<(u32, u32, Option<f64>)> {
    let (Some(width @ 1..), Some(height @ 1..)) = (stream.width, stream.height) else {
        return Err(Error::SourceUnavailable(format!(
            "{}: missing frame dimensions",
            path.display()
        )));
    };

    let fps = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_frame_rate));

    Ok((width, height, fps))
}

#[async_trait]
impl VideoSource for FfmpegSource {
    async fn open(&self, path: &Path) -> Result<Box<dyn FrameStream>> {
        if !path.is_file() {
            return Err(Error::SourceUnavailable(format!(
                "file not found: {}",
                path.display()
            )));
        }

        let (width, height, fps) = self.probe(path).await?;

        let mut child = Command::new(&self.ffmpeg)
            .args(["-v", "error", "-nostdin", "-i"])
            .arg(path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::SourceUnavailable(format!("{}: {e}", path.display())))?;

        let stdout = child.stdout.take().ok_or_else(|| {
            Error::SourceUnavailable(format!("{}: decoder has no stdout", path.display()))
        })?;

        tracing::debug!(path = %path.display(), width, height, ?fps, "video opened");

        Ok(Box::new(FfmpegStream {
            _child: child,
            stdout,
            width,
            height,
            fps,
            index: 0,
        }))
    }
}

/// Frames read from a running `ffmpeg` process
struct FfmpegStream {
    // Held so the decoder is killed when the stream is dropped
    _child: Child,
    stdout: ChildStdout,
    width: u32,
    height: u32,
    fps: Option<f64>,
    index: u64,
}

#[async_trait]
impl FrameStream for FfmpegStream {
    fn fps(&self) -> Option<f64> {
        self.fps
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>> {
        let frame_len = self.width as usize * self.height as usize * RGB24_BYTES;
        let mut pixels = vec![0u8; frame_len];

        match self.stdout.read_exact(&mut pixels).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        self.index += 1;
        Ok(Some(Frame {
            index: self.index,
            width: self.width,
            height: self.height,
            pixels,
        }))
    }
}

/// Parse an ffprobe rational like "30000/1001"; zero or invalid rates are `None`
fn parse_frame_rate(rate: &str) -> Option<f64> {
    let (num, den) = rate.split_once('/').unwrap_or((rate, "1"));
    let num: f64 = num.trim().parse().ok()?;
    let den: f64 = den.trim().parse().ok()?;

    let fps = num / den;
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        let ntsc = parse_frame_rate("30000/1001").unwrap();
        assert!((ntsc - 29.97).abs() < 0.01);
    }

    #[test]
    fn test_parse_frame_rate_rejects_unusable() {
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("0/1"), None);
        assert_eq!(parse_frame_rate("abc"), None);
    }

    #[test]
    fn test_probe_output_shape() {
        let json = r#"{"streams":[{"width":640,"height":480,"r_frame_rate":"30/1","avg_frame_rate":"0/0"}]}"#;
        let probe: ProbeOutput = serde_json::from_str(json).unwrap();
        let stream = &probe.streams[0];
        assert_eq!(stream.width, Some(640));
        assert_eq!(stream.avg_frame_rate.as_deref().and_then(parse_frame_rate), None);
        assert_eq!(stream.r_frame_rate.as_deref().and_then(parse_frame_rate), Some(30.0));
    }

    #[test]
    fn test_stream_geometry() {
        let json = r#"{"width":640,"height":480,"avg_frame_rate":"0/0","r_frame_rate":"25/1"}"#;
        let stream: ProbeStream = serde_json::from_str(json).unwrap();
        let (width, height, fps) = stream_geometry(Path::new("a.mp4"), &stream).unwrap();
        assert_eq!((width, height, fps), (640, 480, Some(25.0)));
    }

    #[test]
    fn test_stream_geometry_rejects_empty_frames() {
        for json in [
            r#"{"width":0,"height":480}"#,
            r#"{"width":640,"height":0}"#,
            r#"{"width":640}"#,
        ] {
            let stream: ProbeStream = serde_json::from_str(json).unwrap();
            let err = stream_geometry(Path::new("a.mp4"), &stream).unwrap_err();
            assert!(matches!(err, Error::SourceUnavailable(_)), "{json}: {err}");
        }
    }
}
