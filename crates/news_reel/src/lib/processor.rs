pub mod builder;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::Utc;
use chrono_tz::Asia::Shanghai;

use crate::{
    capture::PageCapturer,
    digest::{self, preprocess_narration},
    error::Error,
    llm::composer::PageComposer,
    pages,
    render::{self, mapping, render},
    subtitle::{self, format_timestamp_ms, SubtitleGenerator},
    tts::{NarrationScript, Narrator, ScriptSection},
    types::{NewsItem, SectionTiming, Timeline, TimelineEntry},
    video::{AssemblyJob, VideoAssembler},
};

const DETAIL_TEMPLATE: &str = "news_detail_template.html";
const INDEX_TEMPLATE: &str = "index_template.html";

/// Narration sections that never get their own screen: the opener and the
/// sign-off are spoken over the cover card and the last story.
const SKIP_TITLES: [&str; 4] = ["单机游戏日报", "开场", "结束", "结束语"];

/// The daily digest-to-video pipeline, generic over its four external seams:
/// the LLM page composer, the TTS narrator, the page capturer and the video
/// assembler.
pub struct ReelProcessor<C, N, P, V>
where
    C: PageComposer + Send + Sync + 'static,
    N: Narrator + Send + Sync + 'static,
    P: PageCapturer + Send + Sync + 'static,
    V: VideoAssembler + Send + Sync + 'static,
{
    output_dir: PathBuf,
    templates_dir: PathBuf,
    subtitles: SubtitleGenerator,
    composer: C,
    narrator: N,
    capturer: P,
    assembler: V,
}

/// Everything the page-composition stage produced.
#[derive(Debug)]
pub struct PageSet {
    pub index: Option<PathBuf>,
    pub detail_pages: Vec<PathBuf>,
    /// One card per item, in order; feeds the overview page.
    pub cards: Vec<NewsItem>,
}

/// Composes the detail pages and the overview page for a digest.
///
/// Free-standing so the `html`-only CLI mode can run it without constructing
/// a full processor. `{{DATE}}` is substituted in code before the template
/// reaches the model; the model owns the remaining placeholders.
#[tracing::instrument(skip(composer, digest_md))]
pub async fn compose_pages<C: PageComposer>(
    composer: &C,
    digest_md: &str,
    templates_dir: &Path,
    html_dir: &Path,
    date_str: &str,
) -> anyhow::Result<PageSet> {
    let sections = digest::parse_digest(digest_md)?;
    tracing::info!(count = sections.len(), "Parsed news sections");

    let detail_path = templates_dir.join(DETAIL_TEMPLATE);
    if !detail_path.exists() {
        return Err(Error::TemplateNotFound(detail_path).into());
    }
    let detail_template = fs::read_to_string(&detail_path)?;
    let detail_template = render(&detail_template, &mapping([("DATE", date_str)]));

    fs::create_dir_all(html_dir)?;

    let mut cards = Vec::new();
    let mut detail_pages = Vec::new();
    for (i, section) in sections.iter().enumerate() {
        let number = i + 1;
        tracing::info!(number, title = %section.title, "Composing detail page");

        let page = composer
            .compose(section, &detail_template, number)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to compose page {number}: {e:?}"))?;

        let leftovers = render::unresolved(&page.html);
        if !leftovers.is_empty() {
            tracing::warn!(
                number,
                ?leftovers,
                "Composed page still contains placeholder tokens"
            );
        }

        let path = html_dir.join(format!("news_{number}.html"));
        fs::write(&path, &page.html)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        cards.push(NewsItem {
            number: format!("{number:02}"),
            title: section.title.clone(),
            summary: page.summary,
        });
        detail_pages.push(path);
    }

    let index_template_path = templates_dir.join(INDEX_TEMPLATE);
    let index = if index_template_path.exists() {
        let template = fs::read_to_string(&index_template_path)?;
        let html = pages::build_index_page(&template, &cards, date_str);
        let path = html_dir.join("index.html");
        fs::write(&path, html)?;
        tracing::info!(path = ?path, "Wrote overview page");
        Some(path)
    } else {
        tracing::warn!(path = ?index_template_path, "No index template, skipping overview page");
        None
    };

    Ok(PageSet {
        index,
        detail_pages,
        cards,
    })
}

/// Parses the narration markdown into a speakable script.
pub fn narration_script(narration_md: &str) -> Result<NarrationScript, Error> {
    let sections = digest::parse_digest(narration_md)?
        .into_iter()
        .map(|section| ScriptSection {
            title: section.title,
            text: preprocess_narration(&section.body),
        })
        .collect();
    Ok(NarrationScript { sections })
}

impl<C, N, P, V> ReelProcessor<C, N, P, V>
where
    C: PageComposer + Send + Sync + 'static,
    N: Narrator + Send + Sync + 'static,
    P: PageCapturer + Send + Sync + 'static,
    V: VideoAssembler + Send + Sync + 'static,
{
    #[tracing::instrument(skip(self))]
    fn capture_pages(
        &self,
        page_set: &PageSet,
        images_dir: &Path,
    ) -> anyhow::Result<Option<PathBuf>> {
        fs::create_dir_all(images_dir)?;

        let index_image = match &page_set.index {
            Some(index_html) => {
                let png = images_dir.join("index.png");
                self.capturer
                    .capture(index_html, &png)
                    .context("Failed to capture overview page")?;
                Some(png)
            }
            None => None,
        };

        for (i, html) in page_set.detail_pages.iter().enumerate() {
            let png = images_dir.join(format!("news_{}.png", i + 1));
            self.capturer
                .capture(html, &png)
                .with_context(|| format!("Failed to capture page {}", i + 1))?;
        }
        tracing::info!(
            pages = page_set.detail_pages.len() + index_image.is_some() as usize,
            "Captured page screenshots"
        );

        Ok(index_image)
    }

    /// Runs the full pipeline: pages, screenshots, narration, subtitles,
    /// timeline, final video. Stages run strictly one after another; any
    /// failure aborts the run.
    #[tracing::instrument(skip(self))]
    pub async fn run(
        self,
        digest_path: &Path,
        narration_path: &Path,
    ) -> anyhow::Result<PathBuf> {
        let now = Utc::now().with_timezone(&Shanghai);
        let date_tag = now.format("%Y%m%d").to_string();
        let date_str = pages::broadcast_date(now);

        let run_dir = self.output_dir.join(&date_tag);
        let html_dir = run_dir.join("html");
        let images_dir = run_dir.join("images");
        fs::create_dir_all(&run_dir)?;

        // ── pages ────────────────────────────────────────────────────────
        let digest_md = fs::read_to_string(digest_path)
            .with_context(|| format!("Failed to read digest {}", digest_path.display()))?;
        let page_set = compose_pages(
            &self.composer,
            &digest_md,
            &self.templates_dir,
            &html_dir,
            &date_str,
        )
        .await?;

        // ── screenshots ──────────────────────────────────────────────────
        let index_image = self.capture_pages(&page_set, &images_dir)?;

        // ── narration ────────────────────────────────────────────────────
        let narration_md = fs::read_to_string(narration_path)
            .with_context(|| format!("Failed to read narration {}", narration_path.display()))?;
        let script = narration_script(&narration_md)?;

        let audio_path = run_dir.join(format!("audio_{date_tag}.mp3"));
        let narration = self
            .narrator
            .narrate(&script, &audio_path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to synthesize narration: {e:?}"))?;
        tracing::info!(
            total_ms = narration.total_ms,
            sections = narration.sections.len(),
            "Narration synthesized"
        );

        // ── subtitles ────────────────────────────────────────────────────
        // timings come back 1:1 and in order with the speakable sections, so
        // cues pair by position; titles are display text and may repeat
        let spoken: Vec<&ScriptSection> = script
            .sections
            .iter()
            .filter(|s| !s.text.trim().is_empty())
            .collect();
        if spoken.len() != narration.sections.len() {
            tracing::warn!(
                spoken = spoken.len(),
                narrated = narration.sections.len(),
                "Narrated section count differs from speakable script sections"
            );
        }
        let mut cues = Vec::new();
        for (timing, section) in narration.sections.iter().zip(&spoken) {
            cues.extend(self.subtitles.section_cues(
                &section.text,
                timing.start_ms,
                timing.audio_ms,
            ));
        }
        let subtitle_path = run_dir.join(format!("subtitle_{date_tag}.srt"));
        fs::write(&subtitle_path, subtitle::render_srt(&cues))?;

        // ── timeline ─────────────────────────────────────────────────────
        let visual: Vec<SectionTiming> = narration
            .sections
            .iter()
            .filter(|t| !SKIP_TITLES.contains(&t.title.as_str()))
            .cloned()
            .collect();
        if visual.len() != page_set.detail_pages.len() {
            tracing::warn!(
                narrated = visual.len(),
                pages = page_set.detail_pages.len(),
                "Narration sections and news pages differ; stills are matched by position"
            );
        }
        let timeline = Timeline {
            timeline: visual
                .iter()
                .map(|t| TimelineEntry {
                    title: t.title.clone(),
                    start_seconds: format_timestamp_ms(t.start_ms),
                    end_seconds: format_timestamp_ms(t.end_ms),
                })
                .collect(),
        };
        let timeline_path = run_dir.join(format!("timeline_{date_tag}.json"));
        fs::write(&timeline_path, serde_json::to_string_pretty(&timeline)?)?;

        // ── video ────────────────────────────────────────────────────────
        let job = AssemblyJob {
            images_dir,
            index_image,
            timeline: visual,
            audio: narration.audio_path,
            subtitles: Some(subtitle_path),
            output: run_dir.join(format!("video_{date_tag}.mp4")),
        };
        let video = self.assembler.assemble(&job)?;

        tracing::info!(video = ?video, "Pipeline complete");
        Ok(video)
    }
}
