//! # Overview page construction
//!
//! Builds the `index.html` card grid from the per-item titles and summaries.
//! Unlike the detail pages this is pure template substitution, no LLM
//! involved. The layout tightens as the item count grows so ten stories
//! still fit a single 1920x1080 frame.

use std::fmt::Write as _;

use chrono::{DateTime, Datelike, Days, TimeZone};

use crate::{
    render::{mapping, render},
    types::NewsItem,
};

/// Style knobs applied on top of the index template for a given item count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexLayout {
    pub title_px: u32,
    pub summary_px: u32,
    pub item_padding_px: u32,
    pub grid_gap: &'static str,
    /// Summary length cap in characters, `...` included.
    pub summary_chars: usize,
}

/// Layout for `count` news items. Past ten items everything is at its
/// tightest and overflow is the operator's problem.
pub fn layout_for(count: usize) -> IndexLayout {
    let (title_px, summary_px, item_padding_px, grid_gap, summary_chars) = match count {
        0..=4 => (32, 24, 25, "30px 60px", 50),
        5..=6 => (28, 22, 22, "25px 50px", 45),
        7..=8 => (26, 20, 20, "20px 40px", 38),
        9..=10 => (24, 18, 18, "15px 35px", 32),
        _ => {
            tracing::warn!(count, "More than 10 items on the overview page, layout will be cramped");
            (22, 16, 16, "12px 30px", 28)
        }
    };
    IndexLayout {
        title_px,
        summary_px,
        item_padding_px,
        grid_gap,
        summary_chars,
    }
}

/// Caps `summary` at `max` characters, ellipsis included. Counts characters,
/// not bytes, so CJK text truncates cleanly.
pub fn truncate_summary(summary: &str, max: usize) -> String {
    if summary.chars().count() <= max {
        return summary.to_string();
    }
    let mut out: String = summary.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

/// Broadcast date line for the page header: the day *after* `now`, since the
/// evening run produces the next morning's bulletin.
pub fn broadcast_date<Tz: TimeZone>(now: DateTime<Tz>) -> String {
    const WEEKDAYS: [&str; 7] = ["一", "二", "三", "四", "五", "六", "日"];
    let tomorrow = now.checked_add_days(Days::new(1)).expect("date overflow");
    format!(
        "{}年{:02}月{:02}日 星期{}",
        tomorrow.year(),
        tomorrow.month(),
        tomorrow.day(),
        WEEKDAYS[tomorrow.weekday().num_days_from_monday() as usize],
    )
}

fn news_items_html(items: &[NewsItem], layout: &IndexLayout) -> String {
    let mut html = String::new();
    for (i, item) in items.iter().enumerate() {
        let title = item.title.trim_start_matches('#').trim();
        let title = if title.is_empty() {
            format!("新闻 {}", i + 1)
        } else {
            title.to_string()
        };
        let summary = truncate_summary(&item.summary, layout.summary_chars);
        write!(
            html,
            r#"
            <div class="news-item">
                <div class="news-number">{number}</div>
                <div class="news-content">
                    <div class="news-title">{title}</div>
                    <div class="news-summary">{summary}</div>
                </div>
            </div>
"#,
            number = item.number,
        )
        .unwrap();
    }
    html
}

fn dynamic_css(layout: &IndexLayout) -> String {
    format!(
        r#"
    <style>
        .news-title {{
            font-size: {}px !important;
        }}
        .news-summary {{
            font-size: {}px !important;
        }}
        .news-item {{
            padding: {}px !important;
        }}
        .news-grid {{
            gap: {} !important;
        }}
    </style>
    "#,
        layout.title_px, layout.summary_px, layout.item_padding_px, layout.grid_gap,
    )
}

/// Renders the overview page from the per-item cards.
#[tracing::instrument(skip_all, fields(items = items.len()))]
pub fn build_index_page(template: &str, items: &[NewsItem], date_str: &str) -> String {
    let layout = layout_for(items.len());

    let page = render(
        template,
        &mapping([
            ("DATE", date_str.to_string()),
            ("NEWS_ITEMS", news_items_html(items, &layout)),
        ]),
    );

    // count-dependent overrides go in right before </head>
    page.replacen("</head>", &format!("{}</head>", dynamic_css(&layout)), 1)
}
