use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use news_reel::video::{AssemblyJob, VideoAssembler};

#[derive(Clone)]
pub struct MockAssembler {
    pub jobs: Arc<Mutex<Vec<AssemblyJob>>>,
    pub fail_with: Option<String>,
}

impl MockAssembler {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(Mutex::new(Vec::new())),
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

impl VideoAssembler for MockAssembler {
    fn assemble(&self, job: &AssemblyJob) -> anyhow::Result<PathBuf> {
        self.jobs.lock().unwrap().push(job.clone());
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        std::fs::write(&job.output, b"mp4")?;
        Ok(job.output.clone())
    }
}
