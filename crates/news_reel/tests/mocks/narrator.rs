use std::path::Path;
use std::sync::{Arc, Mutex};

use news_reel::{types::SectionTiming, NarrationResult, NarrationScript, Narrator};

const GAP_MS: u64 = 1000;

#[derive(Clone)]
pub struct MockNarrator {
    /// Pretend spoken duration of every section.
    pub section_ms: u64,
    pub calls: Arc<Mutex<Vec<NarrationScript>>>,
    pub fail_with: Option<String>,
}

impl MockNarrator {
    pub fn new(section_ms: u64) -> Self {
        Self {
            section_ms,
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Self::new(0)
        }
    }
}

impl Narrator for MockNarrator {
    const TTS_MODEL: &'static str = "mock-tts";
    type Error = anyhow::Error;

    async fn narrate(
        &self,
        script: &NarrationScript,
        output_audio: &Path,
    ) -> Result<NarrationResult, Self::Error> {
        self.calls.lock().unwrap().push(script.clone());
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }

        std::fs::write(output_audio, b"mp3")?;

        let mut sections = Vec::new();
        let mut cursor_ms = 0;
        let last = script.sections.len().saturating_sub(1);
        for (i, section) in script.sections.iter().enumerate() {
            let start_ms = cursor_ms;
            cursor_ms += self.section_ms;
            if i < last {
                cursor_ms += GAP_MS;
            }
            sections.push(SectionTiming {
                title: section.title.clone(),
                start_ms,
                end_ms: cursor_ms,
                audio_ms: self.section_ms,
            });
        }

        Ok(NarrationResult {
            audio_path: output_audio.to_path_buf(),
            sections,
            total_ms: cursor_ms,
        })
    }
}
