//! # Video assembly
//!
//! Turns the page screenshots, the combined narration track and the subtitle
//! file into the final mp4. All encoding is ffmpeg's problem; this module
//! only decides which still is on screen when.

use std::{ops::Deref, path::PathBuf};

use anyhow::Context;
use media_bindings::{AudioProcessor, Ffmpeg, Still};

use crate::types::SectionTiming;

/// How long the overview card is held before the first story. Narration is
/// delayed by the same amount.
pub const INDEX_CARD_SECS: f64 = 2.0;

#[derive(Debug, Clone)]
pub struct AssemblyJob {
    pub images_dir: PathBuf,
    /// Overview screenshot, shown first when present.
    pub index_image: Option<PathBuf>,
    /// One entry per news item, in on-screen order.
    pub timeline: Vec<SectionTiming>,
    pub audio: PathBuf,
    pub subtitles: Option<PathBuf>,
    pub output: PathBuf,
}

pub trait VideoAssembler {
    fn assemble(&self, job: &AssemblyJob) -> anyhow::Result<PathBuf>;
}

pub struct FfmpegAssembler(pub Ffmpeg);

impl Deref for FfmpegAssembler {
    type Target = Ffmpeg;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl VideoAssembler for FfmpegAssembler {
    #[tracing::instrument(skip_all, fields(output = ?job.output))]
    fn assemble(&self, job: &AssemblyJob) -> anyhow::Result<PathBuf> {
        let audio_ms = self
            .probe_duration_ms(&job.audio)
            .context("Failed to probe narration duration")?;

        let lead_secs = job.index_image.is_some().then_some(INDEX_CARD_SECS);
        let stills = plan_stills(job, lead_secs, audio_ms)?;
        tracing::info!(stills = stills.len(), audio_ms, "Composing slideshow");

        self.compose_slideshow(
            &stills,
            &job.audio,
            lead_secs.unwrap_or(0.0),
            job.subtitles.as_deref(),
            &job.output,
        )
        .context("ffmpeg slideshow composition failed")?;

        Ok(job.output.clone())
    }
}

/// Builds the still sequence for a job: optional index card, one screenshot
/// per timeline entry, and the last frame stretched if the narration would
/// otherwise outrun the picture.
fn plan_stills(
    job: &AssemblyJob,
    lead_secs: Option<f64>,
    audio_ms: u64,
) -> anyhow::Result<Vec<Still>> {
    let mut stills = Vec::new();

    if let Some(index_image) = &job.index_image {
        stills.push(Still {
            image: index_image.clone(),
            duration_secs: lead_secs.unwrap_or(INDEX_CARD_SECS),
        });
    }

    for (i, timing) in job.timeline.iter().enumerate() {
        let image = job.images_dir.join(format!("news_{}.png", i + 1));
        if !image.exists() {
            tracing::warn!(image = ?image, title = %timing.title, "Screenshot missing, skipping still");
            continue;
        }
        stills.push(Still {
            image,
            duration_secs: (timing.end_ms - timing.start_ms) as f64 / 1000.0,
        });
    }

    anyhow::ensure!(!stills.is_empty(), "no stills to assemble");

    // stretch the final frame to cover the full narration
    let required_secs = lead_secs.unwrap_or(0.0) + audio_ms as f64 / 1000.0;
    let planned_secs: f64 = stills.iter().map(|s| s.duration_secs).sum();
    if planned_secs < required_secs {
        let deficit = required_secs - planned_secs;
        tracing::info!(deficit_secs = deficit, "Extending last frame to cover narration");
        stills.last_mut().unwrap().duration_secs += deficit;
    }

    Ok(stills)
}
