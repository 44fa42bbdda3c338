use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("digest contains no news sections")]
    EmptyDigest,
    #[error("template not found: {0}")]
    TemplateNotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
