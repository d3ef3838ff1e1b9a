use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vid2aud::fetch::Fetcher;
use vid2aud::{batch, output, utils, BatchRunner, Cli, Config, ConverterError, DownloadPipeline, YtDlp};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            // Setup and usage errors land here; download failures are
            // handled at the item boundary and map to exit code 1.
            eprintln!("{} {:#}", style("Error:").red().bold(), e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = Config::load().await?;
    if let Some(dir) = &cli.output_dir {
        config.output_dir = Some(dir.clone());
    }

    // Resolve external tools once, before any work begins.
    let tool = YtDlp::resolve(&config).await?;

    let out_dir = config.output_dir()?;
    fs_err::create_dir_all(&out_dir)?;

    let pipeline = Arc::new(DownloadPipeline::new(tool)?);

    match cli.file.clone() {
        Some(path) => {
            let jobs = cli.jobs.unwrap_or(config.max_concurrent_jobs);
            run_batch(pipeline, &cli, path, out_dir, jobs).await
        }
        None => {
            let url = match cli.url.clone() {
                Some(url) => url,
                None => prompt_for_url()?,
            };
            run_single(pipeline.as_ref(), &url, out_dir).await
        }
    }
}

/// Batch mode: read the URL file, run everything, print a report
async fn run_batch(
    pipeline: Arc<DownloadPipeline>,
    cli: &Cli,
    path: std::path::PathBuf,
    out_dir: std::path::PathBuf,
    jobs: usize,
) -> Result<ExitCode> {
    let (urls, invalid) = batch::read_batch(&path)?;
    if !cli.json {
        println!(
            "Found {} unique URLs in {} ({} invalid lines skipped)",
            urls.len(),
            path.display(),
            invalid
        );
    }

    if urls.is_empty() {
        if !cli.json {
            println!("Nothing to download.");
        }
        return Ok(ExitCode::from(if invalid > 0 { 1 } else { 0 }));
    }

    let runner = BatchRunner::new(pipeline, out_dir, jobs);
    let report = runner.run(urls).await;

    if cli.json {
        output::print_report_json(&report)?;
    } else {
        output::print_report(&report);
    }

    Ok(ExitCode::from(if report.all_succeeded() { 0 } else { 1 }))
}

/// Single-URL mode, either from the command line or the prompt
async fn run_single(
    pipeline: &DownloadPipeline,
    url: &str,
    out_dir: std::path::PathBuf,
) -> Result<ExitCode> {
    if !utils::is_supported_url(url) {
        return Err(
            ConverterError::InvalidInput(format!("not a supported video URL: {}", url)).into(),
        );
    }

    let title = pipeline.resolve_title(url).await;
    println!("Video title: {}", title);

    let dest = out_dir.join(format!("{}.mp3", utils::sanitize_title(&title)));
    println!("Saving to: {}", dest.display());

    match pipeline.fetch(url, &dest).await {
        Ok(()) => {
            println!("{} {}", style("Done:").green().bold(), dest.display());
            Ok(ExitCode::from(0))
        }
        Err(e) => {
            eprintln!("{} {:#}", style("Download failed:").red().bold(), e);
            Ok(ExitCode::from(1))
        }
    }
}

fn prompt_for_url() -> Result<String> {
    println!("Welcome to the video to MP3 converter!");
    print!("Enter the video URL: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    let url = line.trim().to_string();

    if url.is_empty() {
        return Err(ConverterError::InvalidInput("no URL provided".to_string()).into());
    }

    Ok(url)
}

fn init_tracing(cli: &Cli) {
    let default_filter = if cli.verbose {
        "vid2aud=debug"
    } else if cli.quiet {
        "vid2aud=error"
    } else {
        "vid2aud=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
