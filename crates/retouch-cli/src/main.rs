mod repl;
mod server;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use retouch_contracts::events::{new_session_id, SessionEventLog};
use retouch_contracts::models::ModelRegistry;
use retouch_contracts::tasks::{category, default_task, CategorySpec, EDITING_CATEGORIES};
use retouch_engine::{
    build_client, build_wire_backend, default_client_registry, BackendKind, EngineConfig,
    GenerateEndpoint, NativeEditor,
};
use tracing::{info, warn};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "retouch", version, about = "AI-assisted photo editing sessions")]
struct Cli {
    /// Generation backend: gemini, proxy or dryrun.
    #[arg(long, global = true, value_parser = parse_backend)]
    backend: Option<BackendKind>,
    #[arg(long, global = true)]
    model: Option<String>,
    /// Base URL of a `retouch serve` instance, for the proxy backend.
    #[arg(long, global = true)]
    proxy_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the editing task catalog.
    Tasks(TasksArgs),
    /// List image models and generation backends.
    Models,
    /// Run one task over a set of images and save the result.
    Edit(EditArgs),
    /// Interactive editing session.
    Session(SessionArgs),
    /// Serve the generate endpoint over HTTP.
    Serve(ServeArgs),
}

#[derive(Debug, Parser)]
struct TasksArgs {
    /// Only list this category, e.g. `filters`.
    #[arg(long)]
    category: Option<String>,
}

#[derive(Debug, Parser)]
struct EditArgs {
    #[arg(required = true)]
    images: Vec<PathBuf>,
    #[arg(long)]
    task: Option<String>,
    /// Replaces the task's prompt; required by the free-form task.
    #[arg(long)]
    prompt: Option<String>,
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct SessionArgs {
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct ServeArgs {
    #[arg(long)]
    bind: Option<String>,
}

fn main() {
    init_tracing();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("retouch error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config = EngineConfig::from_env()
        .with_backend(cli.backend)
        .with_model(cli.model)
        .with_proxy_url(cli.proxy_url);

    match cli.command {
        Command::Tasks(args) => run_tasks(args),
        Command::Models => run_models(&config),
        Command::Edit(args) => run_edit(&config, args),
        Command::Session(args) => run_session(&config, args),
        Command::Serve(args) => run_serve(config.with_bind(args.bind)),
    }
}

fn parse_backend(raw: &str) -> Result<BackendKind, String> {
    BackendKind::parse(raw).ok_or_else(|| format!("unknown backend '{raw}' (gemini, proxy, dryrun)"))
}

fn run_tasks(args: TasksArgs) -> Result<i32> {
    let categories: Vec<&CategorySpec> = match args.category.as_deref() {
        Some(id) => match category(id) {
            Some(found) => vec![found],
            None => bail!("unknown task category '{id}'"),
        },
        None => EDITING_CATEGORIES.iter().collect(),
    };
    let default_id = default_task().id;
    for category in categories {
        println!("{} ({})", category.name, category.id);
        for task in category.tasks {
            let marker = if task.id == default_id { " (default)" } else { "" };
            println!("  {:<24} {}{marker}", task.id, task.name);
        }
    }
    Ok(0)
}

fn run_models(config: &EngineConfig) -> Result<i32> {
    let resolved = config.resolved_model();
    println!("Models:");
    for model in ModelRegistry::default().list() {
        let marker = if model.name == resolved { "*" } else { " " };
        println!(
            "{marker} {:<32} {:<8} {}",
            model.name,
            model.provider,
            model.capabilities.join(",")
        );
    }
    println!("Backends: {}", default_client_registry(config).list().join(" "));
    println!("Selected backend: {}", config.backend);
    let key_status = if config.has_api_key() { "set" } else { "not set" };
    println!("Gemini API key: {key_status}");
    Ok(0)
}

fn run_edit(config: &EngineConfig, args: EditArgs) -> Result<i32> {
    let events = match &args.events {
        Some(path) => SessionEventLog::new(path, new_session_id()),
        None => SessionEventLog::disabled(new_session_id()),
    };
    let mut editor = NativeEditor::new(build_client(config), events);

    let task_id = args.task.as_deref().unwrap_or(default_task().id);
    let task = editor.select_task(task_id)?;
    let report = editor.upload_paths(&args.images);
    for err in &report.rejected {
        eprintln!("Skipped: {err}");
    }
    if report.added.is_empty() {
        bail!("no usable images were provided");
    }
    if report.dropped > 0 {
        eprintln!("Palette full; {} extra file(s) ignored.", report.dropped);
    }
    if let Some(prompt) = args.prompt {
        editor.set_prompt(prompt);
    }

    info!(task_id = task.id, backend = editor.backend_name(), "one-shot edit");
    let entry = editor.generate().with_context(|| format!("{} failed", task.name))?;
    let saved = editor.save_current(&args.out)?;
    println!("{} -> {}", entry.label, saved.display());
    Ok(0)
}

fn run_session(config: &EngineConfig, args: SessionArgs) -> Result<i32> {
    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;
    let events_path = args
        .events
        .clone()
        .unwrap_or_else(|| args.out.join("events.jsonl"));
    let events = SessionEventLog::new(events_path, new_session_id());
    let mut editor = NativeEditor::new(build_client(config), events);
    repl::run_repl(&mut editor, &args.out)?;
    Ok(0)
}

fn run_serve(config: EngineConfig) -> Result<i32> {
    let addr: SocketAddr = config
        .bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", config.bind))?;
    if config.backend != BackendKind::Dryrun && !config.has_api_key() {
        warn!(backend = %config.backend, "no Gemini API key; generate requests will fail");
    }
    let endpoint = GenerateEndpoint::new(build_wire_backend(&config));
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    runtime.block_on(server::serve(addr, endpoint))?;
    Ok(0)
}
