use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlueprintError {
    #[error("config error: {0}")] Config(String),
    #[error("provider error: {0}")] Provider(String),
    #[error("schema error: {0}")] Schema(String),
    #[error("{operation} request failed: {cause}")]
    Generation { operation: &'static str, cause: String },
    #[error("export failed: {0}")] Export(String),
}

impl BlueprintError {
    /// Wraps any lower-level failure of one generation call; the full chain is kept
    /// for logs while the wizard only ever shows its own generic message.
    pub fn generation(operation: &'static str, err: &anyhow::Error) -> Self {
        BlueprintError::Generation { operation, cause: format!("{err:#}") }
    }
}
