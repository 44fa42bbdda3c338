pub mod minimax;

use std::{
    fmt::Debug,
    future::Future,
    path::{Path, PathBuf},
};

use crate::types::SectionTiming;

/// One narrated segment: intro, a news item, or the outro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSection {
    pub title: String,
    /// Preprocessed, speakable text (see `digest::preprocess_narration`).
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct NarrationScript {
    pub sections: Vec<ScriptSection>,
}

#[derive(Debug, Clone)]
pub struct NarrationResult {
    /// The combined audio track, sections joined with silence gaps.
    pub audio_path: PathBuf,
    pub sections: Vec<SectionTiming>,
    pub total_ms: u64,
}

/// Turns a narration script into one combined audio track with per-section
/// timings.
pub trait Narrator {
    const TTS_MODEL: &'static str;

    type Error: Debug;

    fn narrate(
        &self,
        script: &NarrationScript,
        output_audio: &Path,
    ) -> impl Future<Output = Result<NarrationResult, Self::Error>>;
}
