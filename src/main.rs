// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, debug, error, info, warn};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;

use polyglot_relay::app_config::{self, Config};
use polyglot_relay::chat::{ConsoleReplySink, InboundMessage};
use polyglot_relay::providers::Provider;
use polyglot_relay::providers::ollama::Ollama;
use polyglot_relay::translation::{DedupCache, GenerationClient, LlmGenerationClient, MessagePipeline};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read chat events from stdin and post translated replies to stdout (default command)
    Run,

    /// Check that the generation backend is reachable and answers detection prompts
    Check,

    /// Generate shell completions for polyglot-relay
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// polyglot-relay - chat translation relay
///
/// Watches chat events and replies to every eligible message with its
/// translation into the configured target languages.
#[derive(Parser, Debug)]
#[command(name = "polyglot-relay")]
#[command(version)]
#[command(about = "LLM-powered chat translation relay")]
#[command(long_about = "polyglot-relay reads chat events as JSON lines, detects the language of each
eligible message and replies with translations into every configured target language.

EXAMPLES:
    polyglot-relay < events.jsonl                     # Run with the default config
    polyglot-relay -t en -t ko -t ja run              # Override target languages
    polyglot-relay --model qwen2.5 check              # Probe the backend with another model
    polyglot-relay completions bash > relay.bash      # Generate bash completions

EVENT FORMAT:
    {\"conversation_id\":\"C1\",\"message_id\":\"T1\",\"author_id\":\"U1\",\"text\":\"hello team\"}

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, global = true, env = "POLYGLOT_RELAY_CONFIG", default_value = "conf.json")]
    config: PathBuf,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Target language code, repeatable (e.g., -t en -t ko)
    #[arg(short, long = "target", global = true)]
    targets: Vec<String>,

    /// Generation backend endpoint
    #[arg(long, global = true, env = "POLYGLOT_RELAY_ENDPOINT")]
    endpoint: Option<String>,

    /// Model name to use for detection and translation
    #[arg(short, long, global = true, env = "POLYGLOT_RELAY_MODEL")]
    model: Option<String>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI color for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, color) = Self::style_for_level(record.level());

            // Replies go to stdout, so logs stay on stderr
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", color, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with trace level
    // The effective level is set after loading the config
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "polyglot-relay", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;
    log::set_max_level(level_filter(&config.log_level));

    match cli.command {
        Some(Commands::Check) => run_check(&config).await,
        _ => run_relay(config).await,
    }
}

/// Load the config file and apply command line overrides
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    if !cli.config.exists() {
        warn!("Config file not found at '{}', creating default config.", cli.config.display());
    }
    let mut config = Config::load_or_create(&cli.config)?;

    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }
    if !cli.targets.is_empty() {
        config.target_languages = cli.targets.clone();
    }
    if let Some(endpoint) = &cli.endpoint {
        config.provider.endpoint = endpoint.clone();
    }
    if let Some(model) = &cli.model {
        config.provider.model = model.clone();
    }

    // Validate the configuration after loading and overriding
    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

fn build_provider(config: &Config) -> Result<Ollama> {
    Ollama::new_with_config(
        &config.provider.endpoint,
        config.provider.model.clone(),
        config.provider.temperature,
        Duration::from_secs(config.provider.request_timeout_secs),
    )
    .map_err(|e| anyhow!("Failed to create Ollama client: {}", e))
}

fn build_client(config: &Config, provider: Ollama) -> LlmGenerationClient<Ollama> {
    LlmGenerationClient::new(
        provider,
        config.provider.translate_prompt.clone(),
        config.provider.detect_prompt.clone(),
    )
}

/// Probe the backend: version endpoint, then one detection round trip
async fn run_check(config: &Config) -> Result<()> {
    let provider = build_provider(config)?;
    info!("Checking {} with model {}", provider.base_url(), config.provider.model);

    provider
        .test_connection()
        .await
        .context("Generation backend is not reachable")?;

    let client = build_client(config, provider);
    let detected = client
        .detect_language("Good morning team, the release build is ready.")
        .await
        .context("Detection prompt failed")?;

    info!("Backend answered detection prompt with '{}'", detected);
    if detected.code().is_none() {
        warn!("Model could not determine the language of an English sample");
    }
    Ok(())
}

/// Console event loop: one task per inbound event, joined at end of input
async fn run_relay(config: Config) -> Result<()> {
    let provider = build_provider(&config)?;
    let client: Arc<dyn GenerationClient> = Arc::new(build_client(&config, provider));
    let dedup = DedupCache::new(config.dedup.ttl());
    let pipeline = Arc::new(MessagePipeline::from_config(
        &config,
        dedup,
        client,
        Arc::new(ConsoleReplySink),
    ));

    info!(
        "Relaying into [{}], reading events from stdin",
        pipeline.target_languages().join(", ")
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks = JoinSet::new();

    while let Some(line) = lines.next_line().await.context("Failed to read event from stdin")? {
        if line.trim().is_empty() {
            continue;
        }

        let message = match InboundMessage::from_json(&line) {
            Ok(message) => message,
            Err(e) => {
                warn!("Dropping event: {}", e);
                continue;
            }
        };

        let pipeline = pipeline.clone();
        tasks.spawn(async move { pipeline.handle_event(message).await });

        // Reap finished tasks so the set does not grow with the input
        while let Some(joined) = tasks.try_join_next() {
            log_join_result(joined);
        }
    }

    debug!("End of input, waiting for {} in-flight message(s)", tasks.len());
    while let Some(joined) = tasks.join_next().await {
        log_join_result(joined);
    }

    info!("{}", pipeline.stats().summary());
    Ok(())
}

fn log_join_result(joined: Result<polyglot_relay::PipelineOutcome, tokio::task::JoinError>) {
    match joined {
        Ok(outcome) => debug!("Event settled: {:?}", outcome),
        Err(e) => error!("Event task failed: {}", e),
    }
}
