//! # Subtitle generation
//!
//! The TTS vendor returns plain audio with no word timings, so cue timing is
//! estimated from text length at a fixed reading speed and then scaled to the
//! measured duration of each narrated section. Cues are kept short enough to
//! render on a single line in a 1920-wide frame.

use std::{fmt::Write as _, sync::LazyLock};

use regex::Regex;

static EFFECTIVE_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^一-龥a-zA-Z0-9]").unwrap());

const SENTENCE_ENDINGS: [char; 12] = [
    '，', '。', '！', '？', '；', '：', ',', '!', '.', '?', ';', ':',
];
const SECONDARY_SPLITS: [char; 6] = ['，', '、', '：', '；', ',', ';'];

/// A subtitle cue. Times are absolute within the full audio track.
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub start_secs: f64,
    pub end_secs: f64,
    pub text: String,
}

#[derive(Debug, Clone, Copy)]
pub struct SubtitleGenerator {
    /// Estimated reading speed over effective (CJK/alphanumeric) characters.
    pub chars_per_second: f64,
    /// Longest cue that still fits one line on screen.
    pub max_line_chars: usize,
}

impl Default for SubtitleGenerator {
    fn default() -> Self {
        Self {
            chars_per_second: 4.5,
            max_line_chars: 30,
        }
    }
}

impl SubtitleGenerator {
    /// Splits narration text into cue-sized pieces: first at sentence
    /// punctuation, then oversized pieces again at commas or, failing that,
    /// at a hard character limit.
    pub fn split_sentences(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut current = String::new();
        for c in text.chars() {
            current.push(c);
            if SENTENCE_ENDINGS.contains(&c) {
                if !current.trim().is_empty() {
                    sentences.push(current.trim().to_string());
                }
                current.clear();
            }
        }
        if !current.trim().is_empty() {
            sentences.push(current.trim().to_string());
        }

        sentences
            .into_iter()
            .flat_map(|s| self.split_long_sentence(&s))
            .collect()
    }

    fn split_long_sentence(&self, sentence: &str) -> Vec<String> {
        if sentence.chars().count() <= self.max_line_chars {
            return vec![sentence.to_string()];
        }

        let comfortable = (self.max_line_chars as f64 * 0.6) as usize;
        let mut parts = Vec::new();
        let mut current: Vec<char> = Vec::new();

        for c in sentence.chars() {
            current.push(c);

            if current.len() >= comfortable && SECONDARY_SPLITS.contains(&c) {
                parts.push(current.iter().collect::<String>().trim().to_string());
                current.clear();
            } else if current.len() >= self.max_line_chars {
                // back off a few characters to the nearest natural break
                let mut split_at = current.len();
                for j in (current.len().saturating_sub(5)..current.len()).rev() {
                    let cj = current[j];
                    if SECONDARY_SPLITS.contains(&cj) || cj == ' ' || cj == '　' {
                        split_at = j + 1;
                        break;
                    }
                }
                let head: String = current[..split_at].iter().collect();
                parts.push(head.trim().to_string());
                current.drain(..split_at);
            }
        }

        let tail: String = current.iter().collect();
        if !tail.trim().is_empty() {
            parts.push(tail.trim().to_string());
        }
        parts.retain(|p| !p.is_empty());
        parts
    }

    /// Estimated speaking time for `text`, never below half a second.
    pub fn estimate_duration_secs(&self, text: &str) -> f64 {
        let effective = EFFECTIVE_CHARS_RE.replace_all(text, "");
        let count = effective.chars().count();
        (count as f64 / self.chars_per_second).max(0.5)
    }

    /// Back-to-back cues for `sentences`, starting at `start_offset_secs`.
    pub fn generate_timeline(&self, sentences: &[String], start_offset_secs: f64) -> Vec<Cue> {
        let mut cues = Vec::with_capacity(sentences.len());
        let mut current = start_offset_secs;
        for sentence in sentences {
            let duration = self.estimate_duration_secs(sentence);
            cues.push(Cue {
                start_secs: current,
                end_secs: current + duration,
                text: sentence.clone(),
            });
            current += duration;
        }
        cues
    }

    /// Cues for one narrated section, calibrated so the estimated span matches
    /// the section's measured audio duration, then shifted to the section's
    /// start within the combined track.
    pub fn section_cues(&self, text: &str, section_start_ms: u64, audio_ms: u64) -> Vec<Cue> {
        let sentences = self.split_sentences(text);
        let estimated = self.generate_timeline(&sentences, 0.0);

        let estimated_total = estimated.last().map(|c| c.end_secs).unwrap_or(0.0);
        let scale = if estimated_total > 0.0 {
            audio_ms as f64 / 1000.0 / estimated_total
        } else {
            1.0
        };

        let offset = section_start_ms as f64 / 1000.0;
        estimated
            .into_iter()
            .map(|cue| Cue {
                start_secs: cue.start_secs * scale + offset,
                end_secs: cue.end_secs * scale + offset,
                text: cue.text,
            })
            .collect()
    }
}

/// `HH:MM:SS,mmm`, the timestamp format shared by the SRT file and the
/// timeline JSON.
pub fn format_timestamp_ms(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02},{:03}", ms % 1000)
}

/// Serializes cues as an SRT document, numbered from 1.
pub fn render_srt(cues: &[Cue]) -> String {
    let mut srt = String::new();
    for (i, cue) in cues.iter().enumerate() {
        writeln!(
            srt,
            "{}\n{} --> {}\n{}\n",
            i + 1,
            format_timestamp_ms((cue.start_secs * 1000.0) as u64),
            format_timestamp_ms((cue.end_secs * 1000.0) as u64),
            cue.text,
        )
        .unwrap();
    }
    srt
}
