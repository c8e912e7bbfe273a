use anyhow::{bail, Context};
use clap::Parser;
use prompt_automator::engine::{self, BroadcastSink, Engine};
use prompt_automator::panel::{parse_prompts, render_status, PanelSettings, StartDecision};
use prompt_automator::{ChromePage, Config};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Types a queue of prompts into a web page, one after another.
#[derive(Parser, Debug)]
#[command(name = "prompt-automator", version, about)]
struct Args {
    /// Page to automate
    #[arg(long)]
    url: String,

    /// File of prompts separated by newlines or commas
    #[arg(long)]
    prompts_file: Option<PathBuf>,

    /// A single prompt; may be repeated
    #[arg(long = "prompt")]
    prompts: Vec<String>,

    /// CSS selector for the prompt input
    #[arg(long)]
    input_selector: Option<String>,

    /// CSS selector for the submit button
    #[arg(long)]
    button_selector: Option<String>,

    /// Milliseconds between typed characters
    #[arg(long)]
    typing_speed: Option<u64>,

    /// Milliseconds between prompts
    #[arg(long)]
    delay_between: Option<u64>,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where the last-used panel values are kept
    #[arg(long, default_value = "prompt-automator.json")]
    settings: PathBuf,

    /// Show the browser window
    #[arg(long)]
    headful: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if args.headful {
        config.browser.headless = false;
    }

    let mut settings = PanelSettings::load(&args.settings)
        .with_context(|| format!("reading {}", args.settings.display()))?;
    if let Some(speed) = args.typing_speed {
        settings.typing_speed = speed;
    }
    if let Some(delay) = args.delay_between {
        settings.delay_between = delay;
    }
    if let Some(selector) = args.input_selector {
        settings.input_selector = selector;
    }
    if let Some(selector) = args.button_selector {
        settings.button_selector = selector;
    }
    settings.save(&args.settings)?;

    let mut raw = args.prompts.join("\n");
    if let Some(path) = &args.prompts_file {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        raw.push('\n');
        raw.push_str(&text);
    }
    let prompts = parse_prompts(&raw);

    let url = Url::parse(&args.url).with_context(|| format!("invalid url {}", args.url))?;

    let page = ChromePage::launch(&config.browser)?;
    page.navigate(&url).await?;

    let sink = BroadcastSink::new(config.reporter.channel_capacity);
    let mut statuses = sink.subscribe();
    let handle = engine::spawn(Engine::new(page, sink, &config));

    let current = handle.status().await?;
    let Some(command) = StartDecision::decide(&current, prompts, &settings).into_command() else {
        println!("Add prompts first");
        handle.shutdown().await?;
        return Ok(());
    };
    let first = handle.send(command).await?;
    info!(status = %render_status(&first).label, "run started");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut settled = first.is_settled();
    let mut stdin_open = true;

    while !settled {
        tokio::select! {
            message = statuses.recv() => {
                match message {
                    Ok(message) => {
                        let line = render_status(&message.status);
                        info!(progress = %line.progress, "{}", line.label);
                        settled = message.status.is_settled();
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "status updates dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    stdin_open = false;
                    continue;
                };
                let status = match line.trim() {
                    "stop" => handle.stop().await?,
                    "resume" => handle.resume().await?,
                    "cancel" => handle.cancel().await?,
                    "status" => handle.status().await?,
                    "quit" => {
                        handle.cancel().await?;
                        break;
                    }
                    "" => continue,
                    other => {
                        warn!(
                            command = other,
                            "unknown command, expected stop, resume, cancel, status or quit"
                        );
                        continue;
                    }
                };
                let line = render_status(&status);
                println!("{} ({})", line.label, line.progress);
                settled = status.is_settled();
            }
            _ = tokio::signal::ctrl_c() => {
                handle.cancel().await?;
                break;
            }
        }
    }

    let engine = handle.shutdown().await?;
    let status = engine.status();
    let line = render_status(&status);
    println!("{} ({})", line.label, line.progress);
    if let Some(error) = status.error {
        bail!(error);
    }
    Ok(())
}
