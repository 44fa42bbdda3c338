use std::sync::{Arc, Mutex};

use news_reel::{digest::NewsSection, ComposedPage, PageComposer};

#[derive(Clone)]
pub struct MockComposer {
    /// Overrides the generated page HTML when set.
    pub page_html: Option<String>,
    /// `(number, title)` per compose call, in order.
    pub calls: Arc<Mutex<Vec<(usize, String)>>>,
    /// The template text each call received.
    pub templates: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<String>,
}

impl MockComposer {
    pub fn new() -> Self {
        Self {
            page_html: None,
            calls: Arc::new(Mutex::new(Vec::new())),
            templates: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    pub fn with_page_html(html: &str) -> Self {
        Self {
            page_html: Some(html.to_string()),
            ..Self::new()
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Self::new()
        }
    }
}

impl PageComposer for MockComposer {
    const COMPOSER_MODEL: &'static str = "mock-composer";
    type Error = anyhow::Error;

    async fn compose(
        &self,
        section: &NewsSection,
        detail_template: &str,
        number: usize,
    ) -> Result<ComposedPage, Self::Error> {
        self.calls.lock().unwrap().push((number, section.title.clone()));
        self.templates
            .lock()
            .unwrap()
            .push(detail_template.to_string());
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }

        let html = self.page_html.clone().unwrap_or_else(|| {
            format!(
                "<!DOCTYPE html><html><body><h2>{:02} {}</h2></body></html>",
                number, section.title
            )
        });
        Ok(ComposedPage {
            html,
            summary: format!("{}的摘要", section.title),
        })
    }
}
