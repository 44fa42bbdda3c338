use std::{fmt::Debug, future::Future};

use crate::digest::NewsSection;

/// A detail page produced for one news section, plus the one-line summary
/// shown on the overview card.
#[derive(Debug, Clone)]
pub struct ComposedPage {
    pub html: String,
    pub summary: String,
}

/// Fills the detail-page HTML template with a news section's content.
pub trait PageComposer {
    const COMPOSER_MODEL: &'static str;

    type Error: Debug;

    /// `detail_template` arrives with `{{DATE}}` already substituted; the
    /// composer is responsible for `{{NUMBER}}`, `{{TITLE}}`, `{{SUMMARY}}`
    /// and `{{CONTENT}}`. `number` is 1-based.
    fn compose(
        &self,
        section: &NewsSection,
        detail_template: &str,
        number: usize,
    ) -> impl Future<Output = Result<ComposedPage, Self::Error>>;
}
