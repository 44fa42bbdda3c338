//! Typed wrappers around the external media binaries the pipeline shells out
//! to: `ffmpeg`/`ffprobe` for audio joins and video assembly, and headless
//! Chromium for page screenshots. No media logic lives here beyond argument
//! construction; everything is delegated to the tools themselves.

use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
    process::Command,
};

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{program} exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("{program} did not produce expected output: {path}")]
    MissingOutput { program: String, path: PathBuf },
    #[error("could not parse ffprobe output: {0:?}")]
    InvalidProbeOutput(String),
}

fn run(mut cmd: Command) -> Result<std::process::Output, MediaError> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    tracing::debug!(?cmd, "Running external command");

    let output = cmd.output()?;
    if !output.status.success() {
        return Err(MediaError::CommandFailed {
            program,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(output)
}

/// Audio-side operations the pipeline needs from ffmpeg.
pub trait AudioProcessor {
    /// Duration of an audio file in milliseconds.
    fn probe_duration_ms(&self, audio: &Path) -> Result<u64, MediaError>;

    /// Joins `inputs` in order into a single mp3 at `output`, inserting
    /// `gap_ms` of silence between consecutive inputs.
    fn concat_audio_with_gaps(
        &self,
        inputs: &[PathBuf],
        gap_ms: u64,
        output: &Path,
    ) -> Result<(), MediaError>;
}

/// A single still in a slideshow, shown for `duration_secs`.
#[derive(Debug, Clone)]
pub struct Still {
    pub image: PathBuf,
    pub duration_secs: f64,
}

#[derive(Debug, Clone)]
pub struct Ffmpeg {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl Ffmpeg {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Renders a slideshow of `stills` over `audio` into `output`.
    ///
    /// The audio track starts `audio_delay_secs` into the video (the cover
    /// card is silent). Subtitles, when given, are burned into the frames.
    pub fn compose_slideshow(
        &self,
        stills: &[Still],
        audio: &Path,
        audio_delay_secs: f64,
        subtitles: Option<&Path>,
        output: &Path,
    ) -> Result<(), MediaError> {
        let list_path = output.with_extension("clips.txt");
        std::fs::write(&list_path, concat_playlist(stills))?;

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-y")
            .args(["-f", "concat", "-safe", "0"])
            .arg("-i")
            .arg(&list_path)
            .args(["-itsoffset", &format!("{audio_delay_secs}")])
            .arg("-i")
            .arg(audio);

        let mut vf = String::from("format=yuv420p");
        if let Some(srt) = subtitles {
            // subtitles filter goes first so the format conversion applies on top
            vf = format!("subtitles={},{vf}", filter_escape(srt));
        }
        cmd.args(["-vf", &vf])
            .args(["-r", "24"])
            .args(["-c:v", "libx264", "-preset", "medium"])
            .args(["-c:a", "aac"])
            .args(["-map", "0:v", "-map", "1:a"])
            .arg(output);

        run(cmd)?;

        if let Err(e) = std::fs::remove_file(&list_path) {
            tracing::warn!(error = %e, path = ?list_path, "Failed to remove clip list");
        }

        if !output.exists() {
            return Err(MediaError::MissingOutput {
                program: self.ffmpeg.to_string_lossy().into_owned(),
                path: output.to_path_buf(),
            });
        }
        Ok(())
    }

    fn make_silence(&self, duration_ms: u64, output: &Path) -> Result<(), MediaError> {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-y")
            .args(["-f", "lavfi"])
            .args([
                "-i",
                "anullsrc=r=44100:cl=stereo",
                "-t",
                &format!("{}", duration_ms as f64 / 1000.0),
            ])
            .args(["-c:a", "libmp3lame", "-b:a", "256k"])
            .arg(output);
        run(cmd)?;
        Ok(())
    }
}

impl AudioProcessor for Ffmpeg {
    fn probe_duration_ms(&self, audio: &Path) -> Result<u64, MediaError> {
        let mut cmd = Command::new(&self.ffprobe);
        cmd.args(["-v", "error"])
            .args(["-show_entries", "format=duration"])
            .args(["-of", "default=noprint_wrappers=1:nokey=1"])
            .arg(audio);

        let output = run(cmd)?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_probe_duration_ms(&stdout)
    }

    fn concat_audio_with_gaps(
        &self,
        inputs: &[PathBuf],
        gap_ms: u64,
        output: &Path,
    ) -> Result<(), MediaError> {
        let silence_path = output.with_extension("gap.mp3");
        if gap_ms > 0 && inputs.len() > 1 {
            self.make_silence(gap_ms, &silence_path)?;
        }

        let mut playlist = String::new();
        for (i, input) in inputs.iter().enumerate() {
            if i > 0 && gap_ms > 0 {
                writeln!(playlist, "file '{}'", quote_escape(&silence_path)).unwrap();
            }
            writeln!(playlist, "file '{}'", quote_escape(input)).unwrap();
        }

        let list_path = output.with_extension("list.txt");
        std::fs::write(&list_path, playlist)?;

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-y")
            .args(["-f", "concat", "-safe", "0"])
            .arg("-i")
            .arg(&list_path)
            .args(["-c:a", "libmp3lame", "-b:a", "256k"])
            .arg(output);
        run(cmd)?;

        for leftover in [&list_path, &silence_path] {
            if leftover.exists() {
                if let Err(e) = std::fs::remove_file(leftover) {
                    tracing::warn!(error = %e, path = ?leftover, "Failed to remove scratch file");
                }
            }
        }

        if !output.exists() {
            return Err(MediaError::MissingOutput {
                program: self.ffmpeg.to_string_lossy().into_owned(),
                path: output.to_path_buf(),
            });
        }
        Ok(())
    }
}

/// Page-to-image rasterization.
pub trait PageRasterizer {
    fn screenshot(
        &self,
        html: &Path,
        png: &Path,
        width: u32,
        height: u32,
    ) -> Result<(), MediaError>;
}

#[derive(Debug, Clone)]
pub struct Chromium {
    binary: PathBuf,
}

impl Default for Chromium {
    fn default() -> Self {
        Self::new("chromium")
    }
}

impl Chromium {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl PageRasterizer for Chromium {
    fn screenshot(
        &self,
        html: &Path,
        png: &Path,
        width: u32,
        height: u32,
    ) -> Result<(), MediaError> {
        let html = html.canonicalize()?;

        let mut cmd = Command::new(&self.binary);
        cmd.arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--hide-scrollbars")
            .arg("--no-sandbox")
            // give stylesheets and fonts time to settle before the shot
            .arg("--virtual-time-budget=5000")
            .arg(format!("--window-size={width},{height}"))
            .arg(format!("--screenshot={}", png.display()))
            .arg(format!("file://{}", html.display()));
        run(cmd)?;

        if !png.exists() {
            return Err(MediaError::MissingOutput {
                program: self.binary.to_string_lossy().into_owned(),
                path: png.to_path_buf(),
            });
        }
        Ok(())
    }
}

/// Concat-demuxer playlist for a still sequence. The last image is listed
/// twice without a duration, which is how the demuxer is told to hold the
/// final frame.
fn concat_playlist(stills: &[Still]) -> String {
    let mut playlist = String::new();
    for still in stills {
        writeln!(playlist, "file '{}'", quote_escape(&still.image)).unwrap();
        writeln!(playlist, "duration {}", still.duration_secs).unwrap();
    }
    if let Some(last) = stills.last() {
        writeln!(playlist, "file '{}'", quote_escape(&last.image)).unwrap();
    }
    playlist
}

fn quote_escape(path: &Path) -> String {
    path.to_string_lossy().replace('\'', r"'\''")
}

// The subtitles filter parses its argument itself; ':' and '\' need escaping.
fn filter_escape(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', r"\\")
        .replace(':', r"\:")
        .replace('\'', r"\'")
}

fn parse_probe_duration_ms(stdout: &str) -> Result<u64, MediaError> {
    stdout
        .trim()
        .parse::<f64>()
        .map(|secs| (secs * 1000.0).round() as u64)
        .map_err(|_| MediaError::InvalidProbeOutput(stdout.trim().to_string()))
}
