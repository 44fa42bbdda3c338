//! Minimax asynchronous text-to-speech client.
//!
//! The async t2a flow is upload text file -> submit synthesis task -> poll
//! until done -> download the mp3. Per-section clips are then joined with
//! silence gaps through the client's [`AudioProcessor`].

use std::{path::Path, time::Duration};

use media_bindings::{AudioProcessor, MediaError};
use reqwest::Client;
use serde_json::{json, Value};

use crate::{
    digest::sanitize_filename,
    tts::{NarrationResult, NarrationScript, Narrator},
    types::SectionTiming,
};

/// Silence inserted between narrated sections.
pub const SECTION_GAP_MS: u64 = 1000;

pub struct MinimaxClient<F: AudioProcessor> {
    client: Client,
    api_key: String,
    base_url: String,
    ffmpeg: F,
}

#[derive(Debug, thiserror::Error)]
pub enum MinimaxError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("API error {status_code}: {message}")]
    Api { status_code: i64, message: String },
    #[error("response missing field: {0}")]
    MissingField(&'static str),
    #[error("synthesis task ended in state {0:?}")]
    TaskFailed(String),
    #[error("timed out waiting for synthesis task")]
    Timeout,
    #[error("media error: {0}")]
    Media(#[from] MediaError),
    #[error("narration script has no speakable sections")]
    EmptyScript,
}

impl<F: AudioProcessor> MinimaxClient<F> {
    const TTS_MODEL_NAME: &'static str = "speech-02-hd";
    const MAX_POLL_ATTEMPTS: u32 = 120;
    const POLL_DELAY: Duration = Duration::from_secs(2);

    pub fn new(api_key: impl Into<String>, ffmpeg: F) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.minimaxi.com/v1".into(),
            ffmpeg,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Uploads the narration text and returns the vendor's file id.
    pub async fn upload_text(
        &self,
        text: &str,
        file_name: &str,
    ) -> Result<String, MinimaxError> {
        let part = reqwest::multipart::Part::bytes(text.as_bytes().to_vec())
            .file_name(file_name.to_string())
            .mime_str("text/plain")
            .unwrap();
        let form = reqwest::multipart::Form::new()
            .text("purpose", "t2a_async_input")
            .part("file", part);

        let resp = self
            .client
            .post(format!("{}/files/upload", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to upload narration text"))?;

        let result = resp.error_for_status()?.json::<Value>().await?;
        check_base_resp(&result)?;

        extract_file_id(&result).ok_or(MinimaxError::MissingField("file_id"))
    }

    pub async fn submit_task(&self, text_file_id: &str) -> Result<String, MinimaxError> {
        let payload = synthesis_payload(Self::TTS_MODEL_NAME, text_file_id);

        let resp = self
            .client
            .post(format!("{}/t2a_async_v2", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to submit synthesis task"))?;

        let result = resp.error_for_status()?.json::<Value>().await?;
        check_base_resp(&result)?;

        json_string(&result["task_id"]).ok_or(MinimaxError::MissingField("task_id"))
    }

    async fn query_task(&self, task_id: &str) -> Result<Value, MinimaxError> {
        let resp = self
            .client
            .get(format!("{}/query/t2a_async_query_v2", self.base_url))
            .bearer_auth(&self.api_key)
            .query(&[("task_id", task_id)])
            .send()
            .await?;

        Ok(resp.error_for_status()?.json::<Value>().await?)
    }

    /// Polls the task until it reports `Success`, returning the result file
    /// id. Transient query failures are logged and retried on the next tick.
    pub async fn wait_for_completion(&self, task_id: &str) -> Result<String, MinimaxError> {
        for attempt in 0..Self::MAX_POLL_ATTEMPTS {
            match self.query_task(task_id).await.and_then(|result| {
                check_base_resp(&result)?;
                Ok(result)
            }) {
                Ok(result) => match result["status"].as_str() {
                    Some("Success") => {
                        return extract_file_id(&result)
                            .ok_or(MinimaxError::MissingField("file_id"));
                    }
                    Some(status @ ("Failed" | "Cancel")) => {
                        return Err(MinimaxError::TaskFailed(status.to_string()));
                    }
                    _ => {}
                },
                Err(e) => {
                    tracing::warn!(error = %e, attempt, task_id, "Task status query failed");
                }
            }
            tokio::time::sleep(Self::POLL_DELAY).await;
        }
        Err(MinimaxError::Timeout)
    }

    pub async fn download(&self, file_id: &str, output: &Path) -> Result<(), MinimaxError> {
        let resp = self
            .client
            .get(format!("{}/files/retrieve_content", self.base_url))
            .bearer_auth(&self.api_key)
            .query(&[("file_id", file_id)])
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to download synthesis result"))?;

        let bytes = resp.error_for_status()?.bytes().await?;
        if bytes.len() < 100 {
            tracing::warn!(
                size = bytes.len(),
                "Downloaded audio is suspiciously small, may be an error body"
            );
        }
        tokio::fs::write(output, &bytes).await?;
        Ok(())
    }

    async fn synthesize_section(&self, text: &str, output: &Path) -> Result<(), MinimaxError> {
        let file_id = self.upload_text(text, "section.txt").await?;
        let task_id = self.submit_task(&file_id).await?;
        let result_file_id = self.wait_for_completion(&task_id).await?;
        self.download(&result_file_id, output).await
    }
}

impl<F: AudioProcessor + Send + Sync> Narrator for MinimaxClient<F> {
    const TTS_MODEL: &'static str = Self::TTS_MODEL_NAME;

    type Error = MinimaxError;

    #[tracing::instrument(skip_all, fields(sections = script.sections.len()))]
    async fn narrate(
        &self,
        script: &NarrationScript,
        output_audio: &Path,
    ) -> Result<NarrationResult, Self::Error> {
        let workdir = output_audio.parent().unwrap_or(Path::new("."));

        let mut spoken = Vec::new();
        for (i, section) in script.sections.iter().enumerate() {
            if section.text.trim().is_empty() {
                tracing::warn!(title = %section.title, "Section has no narration text, skipping");
            } else {
                spoken.push((i, section));
            }
        }
        if spoken.is_empty() {
            return Err(MinimaxError::EmptyScript);
        }

        let mut clips = Vec::new();
        let mut measured = Vec::new();
        for (i, section) in &spoken {
            let clip_path = workdir.join(format!(
                "part_{:02}_{}.mp3",
                i + 1,
                sanitize_filename(&section.title)
            ));
            tracing::info!(title = %section.title, "Synthesizing section narration");
            self.synthesize_section(&section.text, &clip_path).await?;

            let audio_ms = self.ffmpeg.probe_duration_ms(&clip_path)?;
            measured.push((section.title.clone(), audio_ms));
            clips.push(clip_path);
        }

        let (timings, total_ms) = timings_with_gaps(&measured, SECTION_GAP_MS);

        self.ffmpeg
            .concat_audio_with_gaps(&clips, SECTION_GAP_MS, output_audio)?;

        for clip in &clips {
            if let Err(e) = std::fs::remove_file(clip) {
                tracing::warn!(error = %e, path = ?clip, "Failed to remove section clip");
            }
        }

        Ok(NarrationResult {
            audio_path: output_audio.to_path_buf(),
            sections: timings,
            total_ms,
        })
    }
}

/// Start/end ledger for the spoken clips, joined with `gap_ms` of silence
/// between consecutive clips. Every `end_ms` except the last includes the
/// following gap; the final clip never carries a trailing gap.
fn timings_with_gaps(sections: &[(String, u64)], gap_ms: u64) -> (Vec<SectionTiming>, u64) {
    let mut timings = Vec::with_capacity(sections.len());
    let mut cursor_ms = 0_u64;
    let last = sections.len().saturating_sub(1);

    for (k, (title, audio_ms)) in sections.iter().enumerate() {
        let start_ms = cursor_ms;
        cursor_ms += audio_ms;
        if k < last {
            cursor_ms += gap_ms;
        }
        timings.push(SectionTiming {
            title: title.clone(),
            start_ms,
            end_ms: cursor_ms,
            audio_ms: *audio_ms,
        });
    }
    (timings, cursor_ms)
}

fn synthesis_payload(model: &str, text_file_id: &str) -> Value {
    json!({
        "model": model,
        "language_boost": "auto",
        "text_file_id": text_file_id,
        "voice_setting": {
            "voice_id": "female-shaonv",
            "speed": 1,
            "vol": 1,
            "pitch": 1
        },
        "audio_setting": {
            "audio_sample_rate": 44100,
            "bitrate": 256000,
            "format": "mp3",
            "channel": 2
        },
        "voice_modify": {
            "pitch": 0,
            "intensity": 0,
            "timbre": 0
        }
    })
}

fn check_base_resp(result: &Value) -> Result<(), MinimaxError> {
    let status_code = result["base_resp"]["status_code"].as_i64().unwrap_or(0);
    if status_code != 0 {
        return Err(MinimaxError::Api {
            status_code,
            message: result["base_resp"]["status_msg"]
                .as_str()
                .unwrap_or("Unknown error")
                .to_string(),
        });
    }
    Ok(())
}

/// The upload and query endpoints have disagreed over the years about where
/// the file id lives and whether it is a number or a string.
fn extract_file_id(result: &Value) -> Option<String> {
    [
        &result["file_id"],
        &result["data"]["file"]["id"],
        &result["file"]["file_id"],
    ]
    .into_iter()
    .find_map(json_string)
}

fn json_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
