use anyhow::{Context, Result};
use clap::Parser;
use regex::Regex;
use tracing_subscriber::EnvFilter;
use volcan::{
    cli::Cli,
    ingest,
    prompt::TerminalPrompt,
    render::AsciiRenderer,
    session::Session,
    stats::ResamplePolicy,
};

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.debug);

    let metric_filter = args
        .metric_filter
        .as_deref()
        .map(Regex::new)
        .transpose()
        .context("invalid --filter expression")?;

    let resample = args.resample_count.map(|resamples| ResamplePolicy {
        resamples,
        seed: args.seed,
    });

    let ingested = ingest::load_results(&args.emf_logs, metric_filter.as_ref(), resample)
        .with_context(|| format!("ingesting A/B test results from {}", args.emf_logs.display()))?;

    let mut prompt = TerminalPrompt::stdin();
    let mut renderer = AsciiRenderer::new();
    Session::new(&mut prompt, &mut renderer)
        .run(ingested)
        .context("analysis session failed")?;

    Ok(())
}
