use crate::wire::{LlmRequest, LlmResponse, Stage};
use fs_err as fs;
use serde_json::to_string_pretty;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Logs go to stderr so they never interleave with the wizard's prompts on stdout.
pub fn init_tracing(debug: bool) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if debug {
                EnvFilter::try_new("vibe_blueprint=debug,warn")
            } else {
                EnvFilter::try_new("vibe_blueprint=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(debug)
                .with_line_number(false)
                .with_file(false)
                .compact(),
        )
        .try_init()?;
    Ok(())
}

pub struct SavedPaths {
    pub dir: PathBuf,
    pub request: Option<PathBuf>,
    pub response: Option<PathBuf>,
}

/// Writes each generation exchange under `<root>/.blueprint/tx/<session>/`.
#[derive(Debug, Clone)]
pub struct ArtifactRecorder {
    dir: PathBuf,
    save_request: bool,
    save_response: bool,
}

pub fn tx_dir(root: &Path, tx: Uuid) -> PathBuf {
    root.join(".blueprint").join("tx").join(tx.to_string())
}

impl ArtifactRecorder {
    /// `None` when neither flag is set, so callers skip recording entirely.
    pub fn new(root: &Path, session: Uuid, save_request: bool, save_response: bool) -> Option<Self> {
        (save_request || save_response).then(|| Self {
            dir: tx_dir(root, session),
            save_request,
            save_response,
        })
    }

    pub fn save_stage(
        &self,
        stage: Stage,
        req: &LlmRequest,
        resp: Option<&LlmResponse>,
    ) -> anyhow::Result<SavedPaths> {
        fs::create_dir_all(&self.dir)?;

        let mut request_path = None;
        let mut response_path = None;

        if self.save_request {
            let p = self.dir.join(format!("{}.request.json", stage.as_str()));
            fs::write(&p, to_string_pretty(req)?)?;
            request_path = Some(p);
        }

        if let (true, Some(resp)) = (self.save_response, resp) {
            let p = self.dir.join(format!("{}.response.json", stage.as_str()));
            fs::write(&p, to_string_pretty(resp)?)?;
            response_path = Some(p);
        }

        Ok(SavedPaths { dir: self.dir.clone(), request: request_path, response: response_path })
    }
}
