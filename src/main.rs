use anyhow::{bail, Result};
use csv_compiler::{
    fetch::{self, ArchiveSource},
    output, CompilerConfig,
};
use reqwest::Client;
use std::env;
use tokio::time::Instant;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,csv_compiler=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) args & config ────────────────────────────────────────────
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <ARCHIVE_PATH_OR_URL> [CONFIG_YAML]", args[0]);
        std::process::exit(1);
    }
    let source = ArchiveSource::parse(&args[1]);
    let config = CompilerConfig::resolve(args.get(2).map(String::as_str))?;
    info!(source = %source, output_dir = %config.output_dir.display(), "startup");

    // ─── 3) load the archive ─────────────────────────────────────────
    let client = Client::new();
    let archive = fetch::load_archive(&client, &source).await?;

    // ─── 4) compile on the blocking pool ─────────────────────────────
    let start = Instant::now();
    let compiler = config.compiler();
    let outcome = tokio::task::spawn_blocking(move || compiler.compile(archive)).await?;
    info!(elapsed = ?start.elapsed(), "compilation finished");

    println!("{}", outcome.log);

    // ─── 5) write artifacts ──────────────────────────────────────────
    let written = output::write_artifacts(&config, &source.name(), &outcome)?;
    info!(log = %written.log.display(), "wrote processing log");
    for path in [&written.csv, &written.xlsx, &written.parquet, &written.summary]
        .into_iter()
        .flatten()
    {
        info!(path = %path.display(), "wrote artifact");
    }

    match &outcome.summary {
        Some(summary) if summary.verification.is_passed() => Ok(()),
        Some(summary) => {
            error!(verification = %summary.verification, "row counts do not reconcile");
            bail!("verification failed")
        }
        None => bail!("no master table was produced, see {}", written.log.display()),
    }
}
