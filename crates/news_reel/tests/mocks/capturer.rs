use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use news_reel::capture::PageCapturer;

#[derive(Clone)]
pub struct MockCapturer {
    /// `(html, png)` per capture call, in order.
    pub calls: Arc<Mutex<Vec<(PathBuf, PathBuf)>>>,
    pub fail_with: Option<String>,
}

impl MockCapturer {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Self::new()
        }
    }
}

impl PageCapturer for MockCapturer {
    fn capture(&self, html: &Path, png: &Path) -> anyhow::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((html.to_path_buf(), png.to_path_buf()));
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        std::fs::write(png, b"png")?;
        Ok(())
    }
}
