use anyhow::{anyhow, Result};
use clap::{Arg, ArgMatches, Command};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter};

use movement_analyzer::render::render_alert;
use movement_analyzer::video::discover_videos;
use movement_analyzer::{AnalysisClient, AnalysisReport, Config, Dashboard, DashboardError};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    let verbose = matches.get_flag("verbose");

    // Initialize logging before anything can warn; the config file may refine the level later
    let from_rust_log = std::env::var_os("RUST_LOG").is_some();
    let initial = if verbose { "debug" } else { "info" };
    let (filter, log_handle) = reload::Layer::new(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_directives(initial))),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::load_from(Path::new(path))?,
        None => Config::load()?,
    };
    if let Some(url) = matches.get_one::<String>("server") {
        config.server.base_url = url.clone();
    }

    if !from_rust_log && !verbose && config.output.log_level != initial {
        log_handle.reload(EnvFilter::new(log_directives(&config.output.log_level)))?;
    }

    config.validate()?;

    match matches.subcommand() {
        Some(("analyze", sub)) => analyze(config, sub).await,
        Some(("dashboard", _)) => run_dashboard(config).await,
        Some(("health", _)) => health(config).await,
        Some(("list", sub)) => list(config, sub),
        Some(("config", sub)) => show_config(config, sub),
        _ => Err(anyhow!("No command given, see --help")),
    }
}

fn log_directives(level: &str) -> String {
    format!("movement_analyzer={},warn", level)
}

fn cli() -> Command {
    Command::new("Movement Analyzer")
        .version(env!("CARGO_PKG_VERSION"))
        .author("TigreRoll")
        .about("Submit videos for movement analysis and review the results")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file")
                .global(true)
        )
        .arg(
            Arg::new("server")
                .short('s')
                .long("server")
                .value_name("URL")
                .help("Analysis service base URL")
                .global(true)
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue)
                .global(true)
        )
        .subcommand(
            Command::new("analyze")
                .about("Submit one video and show the analysis")
                .arg(Arg::new("file").value_name("FILE").required(true))
                .arg(
                    Arg::new("report")
                        .short('r')
                        .long("report")
                        .value_name("PATH")
                        .help("Save the analysis as a JSON report")
                )
                .arg(
                    Arg::new("download")
                        .short('d')
                        .long("download")
                        .value_name("DIR")
                        .num_args(0..=1)
                        .help("Download the processed video (defaults to the configured directory)")
                )
        )
        .subcommand(Command::new("dashboard").about("Interactive dashboard"))
        .subcommand(Command::new("health").about("Check that the analysis service is reachable"))
        .subcommand(
            Command::new("list")
                .about("List videos the picker would offer")
                .arg(Arg::new("dir").value_name("DIR").default_value("."))
                .arg(
                    Arg::new("recursive")
                        .short('R')
                        .long("recursive")
                        .help("Descend into subdirectories")
                        .action(clap::ArgAction::SetTrue)
                )
        )
        .subcommand(
            Command::new("config")
                .about("Show the effective configuration")
                .arg(
                    Arg::new("save")
                        .long("save")
                        .value_name("PATH")
                        .help("Write the configuration as TOML")
                )
        )
}

async fn analyze(config: Config, matches: &ArgMatches) -> Result<()> {
    let file = PathBuf::from(
        matches
            .get_one::<String>("file")
            .ok_or_else(|| anyhow!("FILE is required"))?,
    );

    let client = Arc::new(AnalysisClient::new(config.clone())?);
    let mut dashboard = Dashboard::new(config.clone(), client.clone());

    info!("🚀 Movement Analyzer starting...");
    info!("🌐 Server: {}", config.base_url());

    dashboard.choose(&file).await?;

    let result = match dashboard.submit().await {
        Ok(result) => result,
        Err(e) => {
            if let Some(alert) = e.alert() {
                eprintln!("{}", render_alert(alert));
            }
            println!("{}", dashboard.render());
            return Err(e.into());
        }
    };
    println!("{}", dashboard.render());

    let selected = dashboard
        .session()
        .file()
        .cloned()
        .ok_or_else(|| anyhow!("Selection lost after analysis"))?;
    let mut report = AnalysisReport::new(config.base_url(), selected.clone(), &result);

    if matches.contains_id("download") {
        let dir = matches
            .get_one::<String>("download")
            .map(PathBuf::from)
            .unwrap_or_else(|| config.output.download_dir.clone());
        let saved = client.download(&result.processed_video, &dir).await?;
        println!("Processed video saved to {}", saved.display());
        report = report.with_download(saved);
    }

    if let Some(path) = matches.get_one::<String>("report") {
        if config.output.compute_checksum {
            report = report.with_checksum(selected.calculate_hash().await?);
        }
        report.save(Path::new(path)).await?;
    }

    Ok(())
}

/// One line of input to the interactive dashboard
#[derive(Debug, Clone, PartialEq)]
enum Action {
    Choose(PathBuf),
    List(PathBuf),
    Submit,
    Drop,
    Show,
    Download(Option<PathBuf>),
    Help,
    Quit,
}

impl Action {
    fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let action = match verb.to_lowercase().as_str() {
            "choose" | "add" => {
                if rest.is_empty() {
                    return Err(anyhow!("usage: choose <path>"));
                }
                Action::Choose(PathBuf::from(rest))
            }
            "list" | "ls" => Action::List(PathBuf::from(if rest.is_empty() { "." } else { rest })),
            "submit" => Action::Submit,
            "drop" => Action::Drop,
            "show" => Action::Show,
            "download" => Action::Download((!rest.is_empty()).then(|| PathBuf::from(rest))),
            "help" | "?" => Action::Help,
            "quit" | "exit" | "q" => Action::Quit,
            other => return Err(anyhow!("unknown command: {} (try help)", other)),
        };
        Ok(Some(action))
    }
}

const DASHBOARD_HELP: &str = "\
Commands:
  choose <path>      pick a video (replaces the current one)
  list [dir]         list videos matching the picker filter
  submit             submit the selected video for analysis
  drop               drop the selected video and its results
  show               redraw the dashboard
  download [dir]     save the processed video
  help               this message
  quit               leave the dashboard";

async fn run_dashboard(config: Config) -> Result<()> {
    let client = Arc::new(AnalysisClient::new(config.clone())?);
    let mut dashboard = Dashboard::new(config.clone(), client.clone());
    let (tx, mut rx) = mpsc::unbounded_channel();

    info!("🖥️  Dashboard ready, server {}", config.base_url());
    println!("{}", dashboard.render());
    println!("{}", DASHBOARD_HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let action = match Action::parse(&line) {
                    Ok(Some(action)) => action,
                    Ok(None) => continue,
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                };

                match action {
                    Action::Choose(path) => match dashboard.choose(&path).await {
                        Ok(()) => println!("{}", dashboard.render()),
                        Err(e) => println!("{}", render_alert(&e.to_string())),
                    },
                    Action::List(dir) => match discover_videos(&dir, dashboard.filter(), false) {
                        Ok(videos) if videos.is_empty() => println!("No {} files in {}", dashboard.filter().pattern(), dir.display()),
                        Ok(videos) => videos.iter().for_each(|v| println!("  {}", v.display())),
                        Err(e) => println!("{}", render_alert(&e.to_string())),
                    },
                    Action::Submit => match dashboard.submit_background(tx.clone()) {
                        Ok(_) => println!("{}", dashboard.render()),
                        Err(e) => println!("{}", render_alert(&alert_text(&e))),
                    },
                    Action::Drop => {
                        dashboard.drop_video();
                        println!("{}", dashboard.render());
                    }
                    Action::Show => println!("{}", dashboard.render()),
                    Action::Download(dir) => {
                        let Some(reference) = dashboard.session().processed_video().map(str::to_string) else {
                            println!("No processed video yet");
                            continue;
                        };
                        let dir = dir.unwrap_or_else(|| config.output.download_dir.clone());
                        match client.download(&reference, &dir).await {
                            Ok(saved) => println!("Processed video saved to {}", saved.display()),
                            Err(e) => println!("{}", render_alert(&e.to_string())),
                        }
                    }
                    Action::Help => println!("{}", DASHBOARD_HELP),
                    Action::Quit => break,
                }
            }
            Some(completion) = rx.recv() => {
                match dashboard.complete(completion) {
                    Some(Ok(_)) => println!("{}", dashboard.render()),
                    Some(Err(e)) => {
                        println!("{}", render_alert(&alert_text(&e)));
                        println!("{}", dashboard.render());
                    }
                    None => {}
                }
            }
        }
    }

    dashboard.shutdown();
    info!("👋 Dashboard closed");
    Ok(())
}

fn alert_text(e: &DashboardError) -> String {
    match e.alert() {
        Some(alert) => alert.to_string(),
        None => e.to_string(),
    }
}

async fn health(config: Config) -> Result<()> {
    let client = AnalysisClient::new(config.clone())?;
    match client.health().await {
        Ok(status) if status.healthy => {
            println!(
                "✅ {} is up ({}){}",
                config.base_url(),
                status.status,
                status.message.map(|m| format!(": {}", m)).unwrap_or_default()
            );
            Ok(())
        }
        Ok(status) => Err(anyhow!("{} answered {}", config.base_url(), status.status)),
        Err(DashboardError::Http(e)) => {
            warn!("Analysis service unreachable: {}", e);
            Err(anyhow!("{} is unreachable", config.base_url()))
        }
        Err(e) => Err(e.into()),
    }
}

fn list(config: Config, matches: &ArgMatches) -> Result<()> {
    let dir = matches
        .get_one::<String>("dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let filter = movement_analyzer::AcceptFilter::from_config(&config.upload);

    let videos = discover_videos(&dir, &filter, matches.get_flag("recursive"))?;
    for video in &videos {
        println!("{}", video.display());
    }
    info!("📁 {} videos matching {}", videos.len(), filter.pattern());
    Ok(())
}

fn show_config(config: Config, matches: &ArgMatches) -> Result<()> {
    match matches.get_one::<String>("save") {
        Some(path) => config.save(Path::new(path)),
        None => {
            println!("{}", config.summary());
            Ok(())
        }
    }
}
