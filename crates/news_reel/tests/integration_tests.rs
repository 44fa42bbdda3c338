mod mocks;

use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use chrono_tz::Asia::Shanghai;
use mocks::{
    assembler::MockAssembler, capturer::MockCapturer, composer::MockComposer,
    narrator::MockNarrator,
};
use news_reel::{processor, ReelProcessor, ReelProcessorBuilder};
use tempfile::TempDir;

const DETAIL_TEMPLATE: &str = "<!DOCTYPE html><html><head></head>\
    <body><h1>{{DATE}}</h1><div>{{TITLE}}</div><div>{{CONTENT}}</div></body></html>";
const INDEX_TEMPLATE: &str = "<html><head><title>日报</title></head>\
    <body><h1>{{DATE}}</h1><div class=\"news-grid\">{{NEWS_ITEMS}}</div></body></html>";

const DIGEST_MD: &str = "## 新作发售\n大作今日发售。\n\n---\n\n## 更新上线\n补丁说明见[公告](https://example.com)。\n";
const NARRATION_MD: &str = "## 开场\n大家好。\n\n## 新作发售\n大作今日发售。\n\n## 更新上线\n补丁说明见[公告](https://example.com)。\n\n## 结束语\n明天见。\n";

struct Workspace {
    _dir: TempDir,
    templates_dir: PathBuf,
    output_dir: PathBuf,
    digest: PathBuf,
    narration: PathBuf,
}

fn workspace(with_index_template: bool) -> Workspace {
    let dir = TempDir::new().unwrap();
    let templates_dir = dir.path().join("templates");
    let output_dir = dir.path().join("output");
    fs::create_dir_all(&templates_dir).unwrap();

    fs::write(
        templates_dir.join("news_detail_template.html"),
        DETAIL_TEMPLATE,
    )
    .unwrap();
    if with_index_template {
        fs::write(templates_dir.join("index_template.html"), INDEX_TEMPLATE).unwrap();
    }

    let digest = dir.path().join("newsText.md");
    let narration = dir.path().join("audioText.md");
    fs::write(&digest, DIGEST_MD).unwrap();
    fs::write(&narration, NARRATION_MD).unwrap();

    Workspace {
        _dir: dir,
        templates_dir,
        output_dir,
        digest,
        narration,
    }
}

fn build_processor(
    ws: &Workspace,
    composer: MockComposer,
    narrator: MockNarrator,
    capturer: MockCapturer,
    assembler: MockAssembler,
) -> ReelProcessor<MockComposer, MockNarrator, MockCapturer, MockAssembler> {
    ReelProcessorBuilder::new(&ws.output_dir)
        .templates_dir(&ws.templates_dir)
        .composer(composer)
        .narrator(narrator)
        .capturer(capturer)
        .assembler(assembler)
        .build()
}

fn date_tag() -> String {
    Utc::now()
        .with_timezone(&Shanghai)
        .format("%Y%m%d")
        .to_string()
}

fn run_dir(ws: &Workspace) -> PathBuf {
    ws.output_dir.join(date_tag())
}

// ─── Happy path ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_happy_path_produces_video_and_artifacts() {
    let ws = workspace(true);

    let composer = MockComposer::new();
    let narrator = MockNarrator::new(3000);
    let capturer = MockCapturer::new();
    let assembler = MockAssembler::new();

    let composer_calls = composer.calls.clone();
    let narrator_calls = narrator.calls.clone();
    let capturer_calls = capturer.calls.clone();
    let jobs = assembler.jobs.clone();

    let processor = build_processor(&ws, composer, narrator, capturer, assembler);
    let video = processor
        .run(&ws.digest, &ws.narration)
        .await
        .expect("Pipeline should succeed");

    let tag = date_tag();
    let run_dir = run_dir(&ws);
    assert_eq!(video, run_dir.join(format!("video_{tag}.mp4")));
    assert!(video.exists(), "Assembler output should exist");

    // both detail pages plus the overview page
    let html_dir = run_dir.join("html");
    assert!(html_dir.join("news_1.html").exists());
    assert!(html_dir.join("news_2.html").exists());
    assert!(html_dir.join("index.html").exists());

    let index_html = fs::read_to_string(html_dir.join("index.html")).unwrap();
    assert!(index_html.contains("新作发售"));
    assert!(index_html.contains("更新上线的摘要"));

    let composer_calls = composer_calls.lock().unwrap();
    assert_eq!(
        *composer_calls,
        vec![(1, "新作发售".to_string()), (2, "更新上线".to_string())]
    );

    // overview screenshot first, then one per page
    let capturer_calls = capturer_calls.lock().unwrap();
    assert_eq!(capturer_calls.len(), 3);
    assert!(capturer_calls[0].1.ends_with("index.png"));
    assert!(capturer_calls[1].1.ends_with("news_1.png"));
    assert!(capturer_calls[2].1.ends_with("news_2.png"));

    // narration script is the full four sections, preprocessed for speech
    let narrator_calls = narrator_calls.lock().unwrap();
    assert_eq!(narrator_calls.len(), 1);
    let script = &narrator_calls[0];
    assert_eq!(script.sections.len(), 4);
    assert_eq!(script.sections[0].title, "开场");
    assert_eq!(script.sections[2].text, "补丁说明见公告。");

    // subtitle and timeline artifacts
    let srt = fs::read_to_string(run_dir.join(format!("subtitle_{tag}.srt"))).unwrap();
    assert!(srt.starts_with("1\n"));
    assert!(srt.contains(" --> "));

    let timeline: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(run_dir.join(format!("timeline_{tag}.json"))).unwrap())
            .unwrap();
    let entries = timeline["timeline"].as_array().unwrap();
    assert_eq!(entries.len(), 2, "Opener and sign-off get no screen time");
    assert_eq!(entries[0]["title"], "新作发售");
    assert_eq!(entries[1]["title"], "更新上线");

    // the assembly job ties it all together
    let jobs = jobs.lock().unwrap();
    assert_eq!(jobs.len(), 1);
    let job = &jobs[0];
    assert!(job.index_image.as_ref().unwrap().ends_with("index.png"));
    assert_eq!(job.timeline.len(), 2);
    assert!(job.audio.ends_with(format!("audio_{tag}.mp3")));
    assert!(job
        .subtitles
        .as_ref()
        .unwrap()
        .ends_with(format!("subtitle_{tag}.srt")));
}

#[tokio::test]
async fn test_missing_index_template_skips_overview() {
    let ws = workspace(false);

    let composer = MockComposer::new();
    let narrator = MockNarrator::new(2000);
    let capturer = MockCapturer::new();
    let assembler = MockAssembler::new();

    let capturer_calls = capturer.calls.clone();
    let jobs = assembler.jobs.clone();

    let processor = build_processor(&ws, composer, narrator, capturer, assembler);
    processor
        .run(&ws.digest, &ws.narration)
        .await
        .expect("Pipeline should succeed without an index template");

    assert!(!run_dir(&ws).join("html").join("index.html").exists());

    let capturer_calls = capturer_calls.lock().unwrap();
    assert_eq!(capturer_calls.len(), 2, "Only the detail pages are captured");

    let jobs = jobs.lock().unwrap();
    assert!(jobs[0].index_image.is_none());
}

#[tokio::test]
async fn test_pages_with_leftover_placeholders_are_still_written() {
    let ws = workspace(true);

    let composer =
        MockComposer::with_page_html("<!DOCTYPE html><html><body>{{TITLE}}</body></html>");
    let processor = build_processor(
        &ws,
        composer,
        MockNarrator::new(2000),
        MockCapturer::new(),
        MockAssembler::new(),
    );

    processor
        .run(&ws.digest, &ws.narration)
        .await
        .expect("Leftover placeholders are logged, not fatal");

    let page = fs::read_to_string(run_dir(&ws).join("html").join("news_1.html")).unwrap();
    assert!(page.contains("{{TITLE}}"));
}

#[tokio::test]
async fn test_duplicate_titles_keep_their_own_subtitles() {
    let ws = workspace(true);
    fs::write(
        &ws.narration,
        "## 更新上线\n第一次更新说明。\n\n## 更新上线\n完全不同的第二条正文。\n",
    )
    .unwrap();

    let processor = build_processor(
        &ws,
        MockComposer::new(),
        MockNarrator::new(3000),
        MockCapturer::new(),
        MockAssembler::new(),
    );
    processor
        .run(&ws.digest, &ws.narration)
        .await
        .expect("Pipeline should succeed");

    let srt =
        fs::read_to_string(run_dir(&ws).join(format!("subtitle_{}.srt", date_tag()))).unwrap();
    assert!(srt.contains("第一次更新说明。"), "got: {srt}");
    assert!(srt.contains("完全不同的第二条正文。"), "got: {srt}");
}

// ─── Edge cases ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_empty_digest_aborts_before_any_seam() {
    let ws = workspace(true);
    fs::write(&ws.digest, "---\n   \n---\n").unwrap();

    let composer = MockComposer::new();
    let narrator = MockNarrator::new(2000);
    let capturer = MockCapturer::new();
    let assembler = MockAssembler::new();

    let composer_calls = composer.calls.clone();
    let narrator_calls = narrator.calls.clone();
    let capturer_calls = capturer.calls.clone();

    let processor = build_processor(&ws, composer, narrator, capturer, assembler);
    let result = processor.run(&ws.digest, &ws.narration).await;
    assert!(result.is_err(), "Empty digest should abort the run");

    assert!(composer_calls.lock().unwrap().is_empty());
    assert!(narrator_calls.lock().unwrap().is_empty());
    assert!(capturer_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_detail_template_is_reported() {
    let dir = TempDir::new().unwrap();
    let composer = MockComposer::new();

    let result = processor::compose_pages(
        &composer,
        "## 新作\n内容。",
        dir.path(),
        &dir.path().join("html"),
        "2024年01月02日 星期二",
    )
    .await;

    let err = result.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<news_reel::Error>(),
        Some(news_reel::Error::TemplateNotFound(_))
    ));
    assert!(composer.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_date_is_substituted_before_composition() {
    let ws = workspace(false);
    let composer = MockComposer::new();

    let page_set = processor::compose_pages(
        &composer,
        DIGEST_MD,
        &ws.templates_dir,
        &ws.output_dir.join("html"),
        "2024年01月02日 星期二",
    )
    .await
    .unwrap();

    assert_eq!(page_set.detail_pages.len(), 2);
    assert!(page_set.index.is_none());
    assert_eq!(page_set.cards[0].number, "01");
    assert_eq!(page_set.cards[1].title, "更新上线");

    let templates = composer.templates.lock().unwrap();
    assert!(templates[0].contains("<h1>2024年01月02日 星期二</h1>"));
    assert!(!templates[0].contains("{{DATE}}"));
    // the composer's own placeholders are untouched
    assert!(templates[0].contains("{{TITLE}}"));
}

// ─── Error propagation ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_composer_failure_propagates_error() {
    let ws = workspace(true);
    let processor = build_processor(
        &ws,
        MockComposer::failing("LLM rate limit"),
        MockNarrator::new(2000),
        MockCapturer::new(),
        MockAssembler::new(),
    );

    let result = processor.run(&ws.digest, &ws.narration).await;
    let err_msg = format!("{:?}", result.unwrap_err());
    assert!(err_msg.contains("LLM rate limit"), "got: {err_msg}");
}

#[tokio::test]
async fn test_narrator_failure_propagates_error() {
    let ws = workspace(true);
    let processor = build_processor(
        &ws,
        MockComposer::new(),
        MockNarrator::failing("TTS quota exhausted"),
        MockCapturer::new(),
        MockAssembler::new(),
    );

    let result = processor.run(&ws.digest, &ws.narration).await;
    let err_msg = format!("{:?}", result.unwrap_err());
    assert!(err_msg.contains("TTS quota exhausted"), "got: {err_msg}");
}

#[tokio::test]
async fn test_capturer_failure_propagates_error() {
    let ws = workspace(true);

    let narrator = MockNarrator::new(2000);
    let narrator_calls = narrator.calls.clone();

    let processor = build_processor(
        &ws,
        MockComposer::new(),
        narrator,
        MockCapturer::failing("chromium crashed"),
        MockAssembler::new(),
    );

    let result = processor.run(&ws.digest, &ws.narration).await;
    assert!(result.is_err(), "Should propagate capture error");

    // capture happens before narration, so the narrator is never reached
    assert!(narrator_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_assembler_failure_propagates_error() {
    let ws = workspace(true);
    let processor = build_processor(
        &ws,
        MockComposer::new(),
        MockNarrator::new(2000),
        MockCapturer::new(),
        MockAssembler::failing("ffmpeg exited with 1"),
    );

    let result = processor.run(&ws.digest, &ws.narration).await;
    let err_msg = format!("{:?}", result.unwrap_err());
    assert!(err_msg.contains("ffmpeg exited with 1"), "got: {err_msg}");
}
