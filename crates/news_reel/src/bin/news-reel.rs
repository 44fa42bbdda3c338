use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use chrono_tz::Asia::Shanghai;
use clap::{Parser, Subcommand};
use media_bindings::{Chromium, Ffmpeg};
use news_reel::{
    capture::ChromiumCapture,
    minimax::MinimaxClient,
    openai::OpenAIClient,
    pages, processor,
    tracing::init_tracing_subscriber,
    video::FfmpegAssembler,
    ReelProcessorBuilder,
};

#[derive(Parser)]
#[command(name = "news-reel", about = "Daily markdown news digest to narrated video")]
struct Cli {
    /// OpenAI-compatible LLM API key
    #[arg(long, env = "LLM_API_KEY")]
    llm_api_key: Option<String>,

    /// Minimax TTS API key
    #[arg(long, env = "MINIMAX_API_KEY")]
    minimax_api_key: Option<String>,

    /// OpenAI-compatible endpoint base URL
    #[arg(long, env = "LLM_BASE_URL", default_value = "https://api.deepseek.com/v1")]
    llm_base_url: String,

    /// Chat model used to compose detail pages
    #[arg(long, env = "LLM_MODEL", default_value = "deepseek-chat")]
    llm_model: String,

    /// News digest markdown (one `## Title` section per story)
    #[arg(long, env = "NEWS_MD_PATH", default_value = "newsText.md")]
    digest: PathBuf,

    /// Narration markdown (intro + stories + outro)
    #[arg(long, env = "AUDIO_MD_PATH", default_value = "audioText.md")]
    narration: PathBuf,

    /// Directory holding the HTML page templates
    #[arg(long, default_value = "templates")]
    templates_dir: PathBuf,

    /// Base directory for dated run outputs
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Chromium binary used for screenshots
    #[arg(long, env = "CHROMIUM_PATH", default_value = "chromium")]
    chromium: PathBuf,

    /// Screenshot viewport width
    #[arg(long, default_value = "1920")]
    width: u32,

    /// Screenshot viewport height
    #[arg(long, default_value = "1080")]
    height: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline and produce the day's video
    Run,
    /// Generate the HTML pages only, for template review in a browser
    Html,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing_subscriber()?;

    let llm_api_key = cli.llm_api_key.context("LLM_API_KEY not set")?;
    let composer = OpenAIClient::new(llm_api_key)
        .with_base_url(&cli.llm_base_url)
        .with_model(&cli.llm_model);

    match cli.command {
        Command::Run => {
            let minimax_api_key = cli.minimax_api_key.context("MINIMAX_API_KEY not set")?;
            let ffmpeg = Ffmpeg::default();
            let narrator = MinimaxClient::new(minimax_api_key, ffmpeg.clone());
            let capturer =
                ChromiumCapture::new(Chromium::new(&cli.chromium), cli.width, cli.height);
            let assembler = FfmpegAssembler(ffmpeg);

            let processor = ReelProcessorBuilder::new(&cli.output_dir)
                .templates_dir(&cli.templates_dir)
                .composer(composer)
                .narrator(narrator)
                .capturer(capturer)
                .assembler(assembler)
                .build();

            let video = processor.run(&cli.digest, &cli.narration).await?;
            tracing::info!(video = ?video, "Video ready");
        }
        Command::Html => {
            let now = Utc::now().with_timezone(&Shanghai);
            let html_dir = cli
                .output_dir
                .join(now.format("%Y%m%d").to_string())
                .join("html");

            let digest_md = std::fs::read_to_string(&cli.digest)
                .with_context(|| format!("Failed to read digest {}", cli.digest.display()))?;

            let page_set = processor::compose_pages(
                &composer,
                &digest_md,
                &cli.templates_dir,
                &html_dir,
                &pages::broadcast_date(now),
            )
            .await?;

            tracing::info!(
                pages = page_set.detail_pages.len(),
                index = page_set.index.is_some(),
                dir = ?html_dir,
                "HTML pages written"
            );
        }
    }

    Ok(())
}
