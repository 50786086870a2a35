use anyhow::Context;
use clap::Parser;
use std::io;
use std::path::Path;
use uuid::Uuid;

mod cli;
mod config;
mod errors;
mod export;
mod generation;
mod log;
mod prompt;
mod provider;
mod render;
mod ux;
mod wire;
mod wizard;

use generation::GenerationClient;
use wizard::runner::Wizard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    log::init_tracing(args.debug)?;

    let cfg = config::Config::resolve(&args)?;
    let session = Uuid::new_v4();
    tracing::debug!(provider = ?cfg.provider, model = %cfg.model, %session, "starting blueprint session");

    let prov = provider::make_provider(&cfg)?;
    let recorder = log::ArtifactRecorder::new(Path::new(&cfg.root), session, cfg.save_request, cfg.save_response);
    if recorder.is_some() {
        tracing::info!(dir = %log::tx_dir(Path::new(&cfg.root), session).display(), "recording LLM exchanges");
    }

    let mut wizard = Wizard::new(GenerationClient::new(prov, recorder));
    if let Some(input) = &args.input {
        let data = config::load_product_input(Path::new(input))?;
        wizard.state_mut().update_field(data.into());
    }

    let out_dir = Path::new(&cfg.out_dir);
    if args.batch {
        if args.input.is_none() {
            anyhow::bail!(errors::BlueprintError::Config("--batch requires --input".into()));
        }
        let mut stdout = io::stdout().lock();
        ux::run_batch(&mut wizard, &mut stdout, out_dir).await.context("batch run failed")?;
        return Ok(());
    }

    let mut console = ux::Console::new(io::stdin().lock(), io::stdout().lock());
    ux::run_interactive(&mut wizard, &mut console, out_dir).await
}
