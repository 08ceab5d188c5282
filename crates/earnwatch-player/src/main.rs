//! `earnwatch` command line: watch a video under the guard, inspect or clear saved progress

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use earnwatch_api::{AuthClient, CompletionReporter, ReqwestTransport};
use earnwatch_core::{FileStorage, ProgressStore, VideoId};
use earnwatch_player::{
    render_text, CompletionStatus, EarnwatchConfig, GuardCommand, ShareAction, SharePayload,
    SimulatedPlayer, TerminalClipboard, WatchGuard,
};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const HELP_KEYS: &str = "keys: <enter>/p play-pause, b rewind, f forward, seek <secs>, l like, s share, q quit";

fn state_dir_arg() -> Arg {
    Arg::new("state-dir")
        .long("state-dir")
        .value_parser(value_parser!(PathBuf))
        .help("Directory holding persisted progress")
}

fn video_id_arg() -> Arg {
    Arg::new("video-id")
        .long("video-id")
        .required(true)
        .help("Video to act on")
}

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .value_parser(value_parser!(PathBuf))
        .help("TOML configuration file")
}

fn cli() -> Command {
    Command::new("earnwatch")
        .version(earnwatch_player::VERSION)
        .about("Watch-to-earn progress guard")
        .subcommand_required(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("watch")
                .about("Watch a video with a simulated player")
                .arg(video_id_arg())
                .arg(
                    Arg::new("duration")
                        .long("duration")
                        .required(true)
                        .value_parser(value_parser!(f64))
                        .help("Video length in seconds"),
                )
                .arg(
                    Arg::new("api-base")
                        .long("api-base")
                        .help("Backend base URL, e.g. https://api.example.com/api/v1"),
                )
                .arg(Arg::new("token").long("token").help("Access token"))
                .arg(
                    Arg::new("refresh-cookie")
                        .long("refresh-cookie")
                        .help("Cookie sent to the token refresh endpoint, e.g. refreshToken=..."),
                )
                .arg(
                    Arg::new("video-type")
                        .long("video-type")
                        .help("videoType sent with verification"),
                )
                .arg(state_dir_arg())
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("inspect")
                .about("Print persisted progress as JSON")
                .arg(video_id_arg())
                .arg(state_dir_arg())
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("clear")
                .about("Remove persisted progress")
                .arg(video_id_arg())
                .arg(state_dir_arg())
                .arg(config_arg()),
        )
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_current_span(true).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(args: &ArgMatches) -> Result<EarnwatchConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => EarnwatchConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EarnwatchConfig::default(),
    };
    if let Some(dir) = args.get_one::<PathBuf>("state-dir") {
        config.state_dir = dir.clone();
    }
    Ok(config)
}

fn video_id(args: &ArgMatches) -> Result<VideoId> {
    let id = args
        .get_one::<String>("video-id")
        .context("--video-id is required")?;
    if id.trim().is_empty() {
        bail!("--video-id must not be empty");
    }
    Ok(VideoId::new(id.trim()))
}

fn open_store(config: &EarnwatchConfig) -> Result<ProgressStore<FileStorage>> {
    let storage = FileStorage::open(&config.state_dir)
        .with_context(|| format!("opening state dir {}", config.state_dir.display()))?;
    Ok(ProgressStore::new(storage))
}

fn parse_key(line: &str) -> Option<GuardCommand> {
    let line = line.trim();
    match line {
        "" | "p" => Some(GuardCommand::TogglePlay),
        "b" => Some(GuardCommand::SkipBackward),
        "f" => Some(GuardCommand::SkipForward),
        "l" => Some(GuardCommand::Like),
        "s" => Some(GuardCommand::Share),
        "q" => Some(GuardCommand::Unmount),
        _ => line
            .strip_prefix("seek ")
            .and_then(|secs| secs.trim().parse().ok())
            .map(GuardCommand::SeekTo),
    }
}

/// Stdin is read on a plain thread; a blocked tokio stdin read would hold
/// up runtime shutdown
fn spawn_keyboard(commands: mpsc::Sender<GuardCommand>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match parse_key(&line) {
                Some(command) => {
                    if commands.blocking_send(command).is_err() {
                        break;
                    }
                }
                None => eprintln!("{HELP_KEYS}"),
            }
        }
    });
}

async fn watch(args: &ArgMatches) -> Result<()> {
    let mut config = load_config(args)?;
    if let Some(base) = args.get_one::<String>("api-base") {
        config.api.base_url = base.clone();
    }
    if let Some(video_type) = args.get_one::<String>("video-type") {
        config.api.video_type = video_type.clone();
    }
    config.validate().context("invalid configuration")?;

    let video_id = video_id(args)?;
    let duration = *args
        .get_one::<f64>("duration")
        .context("--duration is required")?;
    if !duration.is_finite() || duration <= 0.0 {
        bail!("--duration must be a positive number of seconds");
    }

    let transport = ReqwestTransport::new(&config.api).context("building HTTP client")?;
    if let Some(cookie) = args.get_one::<String>("refresh-cookie") {
        transport.add_cookie(cookie);
    }
    let client = Arc::new(AuthClient::new(transport, config.api.clone()));
    match args.get_one::<String>("token") {
        Some(token) => client.tokens().set(token.clone()),
        None => warn!("No access token given; the first request will try a refresh"),
    }
    let reporter = Arc::new(CompletionReporter::new(client, &config.api));
    let store = open_store(&config)?;

    let share = SharePayload::for_video(&video_id, config.share_url(&video_id));
    let (guard, mut views) = WatchGuard::new(
        video_id.clone(),
        config.guard.clone(),
        SimulatedPlayer::new(duration),
        store,
        reporter,
    );
    let guard = guard.with_share(ShareAction::new(Arc::new(TerminalClipboard)), share);
    info!(session_id = %guard.session_id(), %video_id, duration, "Starting watch session");

    let (commands, rx) = mpsc::channel(32);
    let session = tokio::spawn(guard.run(rx));

    let step = config.guard.skip_step_secs;
    let render = tokio::spawn(async move {
        let mut last = String::new();
        while views.changed().await.is_ok() {
            let text = render_text(&views.borrow_and_update(), step);
            if text != last {
                print!("{text}");
                last = text;
            }
        }
    });

    eprintln!("{HELP_KEYS}");
    spawn_keyboard(commands.clone());
    let interrupt = commands.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = interrupt.send(GuardCommand::Unmount).await;
        }
    });
    commands
        .send(GuardCommand::Play)
        .await
        .context("watch session ended before it started")?;
    drop(commands);

    let report = session.await.context("watch session task failed")?;
    render.abort();
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let CompletionStatus::Failed(reason) = &report.completion {
        bail!("completion was not verified: {reason}");
    }
    Ok(())
}

fn inspect(args: &ArgMatches) -> Result<()> {
    let config = load_config(args)?;
    let video_id = video_id(args)?;
    let store = open_store(&config)?;

    match store
        .try_load(&video_id)
        .with_context(|| format!("reading progress for {video_id}"))?
    {
        Some(session) => println!("{}", serde_json::to_string_pretty(&session)?),
        None => println!("No saved progress for {video_id}"),
    }
    Ok(())
}

fn clear(args: &ArgMatches) -> Result<()> {
    let config = load_config(args)?;
    let video_id = video_id(args)?;
    open_store(&config)?
        .clear(&video_id)
        .with_context(|| format!("clearing progress for {video_id}"))?;
    println!("Cleared progress for {video_id}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_logging(matches.get_flag("log-json"));

    match matches.subcommand() {
        Some(("watch", args)) => watch(args).await,
        Some(("inspect", args)) => inspect(args),
        Some(("clear", args)) => clear(args),
        _ => unreachable!("subcommand_required is set"),
    }
}
