//! # News digest parsing
//!
//! The pipeline's input is a markdown digest: one `## Title` section per news
//! item (or narration segment). This module splits the digest into sections
//! and normalizes section text into something a TTS voice can read aloud.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::Error;

/// Section title synthesized when a digest has body text before its first
/// heading.
pub const DEFAULT_SECTION_TITLE: &str = "单机游戏日报";

static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"---+").unwrap());
static SECTION_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^##\s+").unwrap());

static ACRONYM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:[A-Z]\.){2,}[A-Z]?\.?").unwrap());
static OBSIDIAN_IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[\[[^\]]*\]\]").unwrap());
static MARKDOWN_IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\] *\([^)]*\)").unwrap());
static MARKDOWN_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\] *\([^)]*\)").unwrap());
static TRAILING_PERIOD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.(\s|$)").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static UNSAFE_FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["'\s\\/:*?<>|]"#).unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsSection {
    pub title: String,
    pub body: String,
}

impl NewsSection {
    /// The section as it appeared in the digest, for prompting.
    pub fn markdown(&self) -> String {
        format!("## {}\n{}", self.title, self.body)
    }
}

/// Splits a markdown digest into `## `-delimited sections.
///
/// `---` separators are dropped first. Text before the first heading gets a
/// synthesized [`DEFAULT_SECTION_TITLE`] heading so nothing is lost.
#[tracing::instrument(skip(content))]
pub fn parse_digest(content: &str) -> Result<Vec<NewsSection>, Error> {
    let mut content = SEPARATOR_RE.replace_all(content, "").into_owned();

    if !content.trim_start().starts_with("##") && !content.trim().is_empty() {
        content = format!("## {DEFAULT_SECTION_TITLE}\n{content}");
    }

    let sections = SECTION_SPLIT_RE
        .split(&content)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(i, section)| {
            let (title, body) = section.split_once('\n').unwrap_or((section, ""));
            let title = title.trim();
            NewsSection {
                title: if title.is_empty() {
                    format!("新闻 {}", i + 1)
                } else {
                    title.to_string()
                },
                body: body.trim().to_string(),
            }
        })
        .collect::<Vec<_>>();

    if sections.is_empty() {
        return Err(Error::EmptyDigest);
    }
    Ok(sections)
}

/// Normalizes markdown section text for speech synthesis.
///
/// Dotted acronyms are collapsed (`S.T.A.L.K.E.R.` reads as `STALKER`),
/// images are dropped, links keep their label, dashes become spaces, ASCII
/// quote pairs become alternating fullwidth quotes, sentence-final periods
/// become their fullwidth form, and whitespace is collapsed to single spaces.
pub fn preprocess_narration(text: &str) -> String {
    let text = ACRONYM_RE.replace_all(text, |caps: &regex::Captures| caps[0].replace('.', ""));
    let text = OBSIDIAN_IMAGE_RE.replace_all(&text, "");
    let text = MARKDOWN_IMAGE_RE.replace_all(&text, "");
    let text = MARKDOWN_LINK_RE.replace_all(&text, "$1");
    let mut normalized = String::with_capacity(text.len());
    let mut open_quote = true;
    for c in text.chars() {
        match c {
            '-' => normalized.push(' '),
            '"' => {
                normalized.push(if open_quote { '“' } else { '”' });
                open_quote = !open_quote;
            }
            _ => normalized.push(c),
        }
    }
    let text = normalized;
    let text = TRAILING_PERIOD_RE.replace_all(&text, "。$1");
    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}

/// Replaces characters that are unsafe in file names with underscores.
pub fn sanitize_filename(name: &str) -> String {
    UNSAFE_FILENAME_RE.replace_all(name, "_").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections() {
        let digest = "## 新作发售\n大作今日发售。\n\n---\n\n## 更新上线\n补丁说明。\n";
        let sections = parse_digest(digest).unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "新作发售");
        assert_eq!(sections[0].body, "大作今日发售。");
        assert_eq!(sections[1].title, "更新上线");
    }

    #[test]
    fn test_leading_text_gets_default_title() {
        let sections = parse_digest("今日要闻如下。\n\n## 第一条\n内容。").unwrap();
        assert_eq!(sections[0].title, DEFAULT_SECTION_TITLE);
        assert_eq!(sections[0].body, "今日要闻如下。");
        assert_eq!(sections[1].title, "第一条");
    }

    #[test]
    fn test_empty_digest_is_an_error() {
        assert!(matches!(parse_digest("  \n "), Err(Error::EmptyDigest)));
        assert!(matches!(parse_digest("---\n---"), Err(Error::EmptyDigest)));
    }

    #[test]
    fn test_acronym_dots_collapse() {
        assert_eq!(
            preprocess_narration("S.T.A.L.K.E.R. 2 和 G.A.M.M.A. 模组"),
            "STALKER 2 和 GAMMA 模组"
        );
    }

    #[test]
    fn test_links_keep_label_and_images_drop() {
        let text = "详见[官方公告](https://example.com)，截图 ![预览](img.png) 和 ![[本地.png]]。";
        assert_eq!(preprocess_narration(text), "详见官方公告，截图 和 。");
    }

    #[test]
    fn test_punctuation_normalization() {
        assert_eq!(
            preprocess_narration(r#"更新说明见 "patch notes". 口碑极佳"#),
            "更新说明见 “patch notes”。 口碑极佳"
        );
    }

    #[test]
    fn test_quotes_alternate_across_pairs() {
        assert_eq!(
            preprocess_narration(r#""新作"和"续作""#),
            "“新作”和“续作”"
        );
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename(r#"新作 "Q*A": 上线/了?"#), "新作__Q_A___上线_了_");
    }
}
