use std::{ops::Deref, path::Path};

use media_bindings::{Chromium, PageRasterizer};

/// Renders a finished HTML page to a full-frame PNG.
pub trait PageCapturer {
    fn capture(&self, html: &Path, png: &Path) -> anyhow::Result<()>;
}

/// Headless-Chromium backed capturer at a fixed viewport.
pub struct ChromiumCapture {
    chromium: Chromium,
    width: u32,
    height: u32,
}

impl ChromiumCapture {
    pub fn new(chromium: Chromium, width: u32, height: u32) -> Self {
        Self {
            chromium,
            width,
            height,
        }
    }
}

impl Default for ChromiumCapture {
    fn default() -> Self {
        Self::new(Chromium::default(), 1920, 1080)
    }
}

impl Deref for ChromiumCapture {
    type Target = Chromium;

    fn deref(&self) -> &Self::Target {
        &self.chromium
    }
}

impl PageCapturer for ChromiumCapture {
    fn capture(&self, html: &Path, png: &Path) -> anyhow::Result<()> {
        self.chromium
            .screenshot(html, png, self.width, self.height)
            .inspect_err(|e| tracing::error!(error = %e, page = ?html, "Failed to capture page"))?;
        Ok(())
    }
}
