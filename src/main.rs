use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use owly::config::{find_config_file, get_config, load_config, Config};
use owly::detail::{DetailPresenter, ModalBody, ModalEvent};
use owly::search::{Activation, Key, SearchOrchestrator, SearchStatus};
use owly::ui::{self, Spinner, Status};
use owly::WorkSummary;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Owly - Search the Open Library catalog by subject
#[derive(Parser, Debug)]
#[command(name = "owly")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search the Open Library catalog by subject", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v, -vv, -vvv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show all environment variables
    #[arg(long, global = true)]
    env: bool,

    /// Catalog base URL (overrides API_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Catalog request timeout in milliseconds (overrides API_TIMEOUT)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Maximum number of cards per search (overrides MAX_RESULTS)
    #[arg(long, global = true)]
    max_results: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Text on a terminal, JSON otherwise
    Auto,
    /// Human-readable cards
    Text,
    /// Machine-readable JSON
    Json,
}

impl OutputFormat {
    fn resolve(self) -> OutputFormat {
        match self {
            OutputFormat::Auto if ui::is_terminal() => OutputFormat::Text,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search works by subject
    #[command(alias = "s")]
    Search {
        /// Subject to search for (e.g. "science fiction")
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Show the extended detail of one work
    #[command(alias = "d")]
    Detail {
        /// Work key, with or without the /works/ prefix (e.g. OL45804W)
        key: String,
    },

    /// Search and open details interactively
    #[command(alias = "i")]
    Interactive,

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

/// Print all available environment variables
fn print_env_vars() {
    println!("Owly - Environment Variables");
    println!();
    println!("Catalog:");
    println!("  API_BASE_URL        Catalog base URL (default: https://openlibrary.org)");
    println!("  API_TIMEOUT         Request timeout in milliseconds (default: 15000)");
    println!("  MAX_RESULTS         Maximum cards per search (default: 50)");
    println!();
    println!("Covers:");
    println!("  COVERS_BASE_URL     Cover image host (default: https://covers.openlibrary.org)");
    println!("  COVER_TIMEOUT       Bounded wait per cover in milliseconds (default: 2000)");
    println!();
    println!("Display:");
    println!("  ERROR_DISPLAY_MS    How long a search error stays visible (default: 5000)");
    println!("  REVEAL_STAGGER_MS   Delay between revealing cards (default: 50)");
    println!();
    println!("Config file overrides (when a config file is used):");
    println!("  OWLY_<KEY>          e.g. OWLY_MAX_RESULTS=10, OWLY_COVERS__TIMEOUT_MS=500");
    println!();
    println!("Other Settings:");
    println!("  RUST_LOG            Rust logging level (e.g., debug, info, warn, error)");
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("owly={}", level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load the config file if one is given or found, then apply CLI overrides
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(path) = &cli.config {
        load_config(path).with_context(|| format!("loading {}", path.display()))?
    } else if let Some(path) = find_config_file() {
        tracing::info!("Using config file: {}", path.display());
        load_config(&path).with_context(|| format!("loading {}", path.display()))?
    } else {
        get_config()
    };

    if let Some(url) = &cli.base_url {
        config = config.api_base_url(url.clone());
    }
    if let Some(ms) = cli.timeout {
        config = config.api_timeout_ms(ms);
    }
    if let Some(max) = cli.max_results {
        config = config.max_results(max);
    }

    config.validate()?;
    Ok(config)
}

/// Accept `OL45804W`, `works/OL45804W` or `/works/OL45804W`
fn normalize_work_key(key: &str) -> String {
    let key = key.trim().trim_start_matches('/');
    if key.starts_with("works/") {
        format!("/{}", key)
    } else {
        format!("/works/{}", key)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.env {
        print_env_vars();
        return Ok(());
    }

    init_tracing(cli.verbose, cli.quiet);

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "owly", &mut std::io::stdout());
        return Ok(());
    }

    let config = resolve_config(&cli)?;
    let format = cli.output.resolve();
    let orchestrator = Arc::new(SearchOrchestrator::from_config(&config)?);
    let presenter = Arc::new(DetailPresenter::new(orchestrator.catalog()));

    match cli.command {
        Some(Commands::Search { query }) => {
            let query = query.join(" ");
            let ok = run_search(&orchestrator, &query, format).await?;
            if !ok {
                std::process::exit(1);
            }
        }
        Some(Commands::Detail { key }) => {
            let work = WorkSummary::new(normalize_work_key(&key), "");
            let ok = run_detail(&presenter, &work, format).await?;
            if !ok {
                std::process::exit(1);
            }
        }
        Some(Commands::Interactive) | None => {
            run_interactive(orchestrator, presenter).await?;
        }
        Some(Commands::Completions { .. }) => {}
    }

    Ok(())
}

/// Run one search and print its cards; returns false when the search failed
async fn run_search(
    orchestrator: &SearchOrchestrator,
    query: &str,
    format: OutputFormat,
) -> Result<bool> {
    let started = Instant::now();
    let spinner = (format == OutputFormat::Text)
        .then(|| Spinner::new(&format!("Searching \"{}\"", query.trim())));

    let outcome = orchestrator.search(query).await;
    let state = orchestrator.snapshot().await;

    if let Some(spinner) = &spinner {
        spinner.finish_and_clear();
    }

    match (&outcome.status, format) {
        (SearchStatus::Rendered { cards }, OutputFormat::Json) => {
            let body = serde_json::json!({
                "query": query.trim(),
                "count": cards,
                "cards": state.container().cards(),
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(true)
        }
        (SearchStatus::Rendered { cards }, _) => {
            ui::print_search_header(query.trim(), *cards, started.elapsed());
            let stagger = orchestrator.config().display.reveal_stagger();
            ui::reveal_cards(&mut std::io::stdout(), state.container().cards(), stagger).await?;
            Ok(true)
        }
        (SearchStatus::Failed(err), OutputFormat::Json) => {
            let body = serde_json::json!({ "query": query.trim(), "error": err.user_message() });
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(false)
        }
        (SearchStatus::Failed(_), _) => {
            ui::print_indicator(state.indicator());
            Ok(false)
        }
        (SearchStatus::Stale, _) => Ok(true),
    }
}

/// Open the modal for one work; returns false when the detail failed to load
async fn run_detail(
    presenter: &DetailPresenter,
    work: &WorkSummary,
    format: OutputFormat,
) -> Result<bool> {
    let spinner = (format == OutputFormat::Text).then(|| Spinner::new("Loading details..."));
    let body = presenter.activate(work).await;

    if let Some(spinner) = &spinner {
        spinner.finish_and_clear();
    }

    let failed = matches!(body, ModalBody::Error { .. });
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else if let Some(modal) = presenter.snapshot().await {
        ui::print_modal(&modal);
    }
    Ok(!failed)
}

/// Read commands from stdin until `:quit` or end of input
///
/// Searches and detail fetches run as spawned tasks, so a new query can be
/// typed while an older one is still loading.
/// One line of interactive input
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplInput {
    Quit,
    Dismiss(ModalEvent),
    /// Open the card with this 1-based number
    Open(usize),
    Search(String),
}

impl ReplInput {
    /// A number opens a card only when that card is on screen, so numeric
    /// subjects such as `1984` are still searchable.
    fn parse(line: &str, cards: usize) -> Self {
        let input = line.trim();
        match input {
            ":quit" | ":q" => Self::Quit,
            ":close" => Self::Dismiss(ModalEvent::CloseClicked),
            ":esc" => Self::Dismiss(ModalEvent::EscapePressed),
            _ => match input.parse::<usize>() {
                Ok(number) if (1..=cards).contains(&number) => Self::Open(number),
                _ => Self::Search(input.to_string()),
            },
        }
    }
}

async fn run_interactive(
    orchestrator: Arc<SearchOrchestrator>,
    presenter: Arc<DetailPresenter>,
) -> Result<()> {
    ui::print_banner();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let cards = orchestrator.snapshot().await.container().len();

        match ReplInput::parse(&line, cards) {
            ReplInput::Quit => break,
            ReplInput::Dismiss(event) => {
                if presenter.dismiss(event).await {
                    ui::print_status(Status::Info, "Detail closed");
                }
            }
            ReplInput::Open(number) => {
                let state = orchestrator.snapshot().await;
                let Some(work) = state
                    .container()
                    .get(number)
                    .and_then(|card| card.activate(Activation::KeyPress(Key::Enter)))
                    .cloned()
                else {
                    ui::print_status(Status::Warning, &format!("No card number {}", number));
                    continue;
                };

                let presenter = Arc::clone(&presenter);
                tokio::spawn(async move {
                    presenter.activate(&work).await;
                    if let Some(modal) = presenter.snapshot().await {
                        ui::print_modal(&modal);
                    }
                });
            }
            ReplInput::Search(query) => {
                let orchestrator = Arc::clone(&orchestrator);
                ui::print_status(Status::Loading, owly::search::state::LOADING_TEXT);
                tokio::spawn(async move {
                    let started = Instant::now();
                    let outcome = orchestrator.search(&query).await;
                    let state = orchestrator.snapshot().await;
                    match outcome.status {
                        SearchStatus::Rendered { cards } => {
                            let elapsed = started.elapsed();
                            ui::print_search_header(query.trim(), cards, elapsed);
                            let revealed = ui::reveal_cards(
                                &mut std::io::stdout(),
                                state.container().cards(),
                                orchestrator.config().display.reveal_stagger(),
                            )
                            .await;
                            if let Err(e) = revealed {
                                tracing::warn!("Failed to print cards: {}", e);
                            }
                        }
                        SearchStatus::Failed(_) => ui::print_indicator(state.indicator()),
                        SearchStatus::Stale => {}
                    }
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["owly"]);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        assert_eq!(cli.output, OutputFormat::Auto);
        assert!(cli.timeout.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::parse_from(["owly", "-vv"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_output_format() {
        let cli = Cli::parse_from(["owly", "-o", "json"]);
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.output.resolve(), OutputFormat::Json);

        let cli = Cli::parse_from(["owly", "--output", "text"]);
        assert_eq!(cli.output.resolve(), OutputFormat::Text);
    }

    #[test]
    fn test_cli_search_command() {
        let cli = Cli::parse_from(["owly", "search", "science", "fiction", "--max-results", "5"]);
        assert_eq!(cli.max_results, Some(5));
        match cli.command {
            Some(Commands::Search { query }) => assert_eq!(query.join(" "), "science fiction"),
            other => panic!("expected search, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_detail_command() {
        let cli = Cli::parse_from(["owly", "detail", "OL45804W", "--timeout", "500"]);
        assert_eq!(cli.timeout, Some(500));
        assert!(matches!(cli.command, Some(Commands::Detail { ref key }) if key == "OL45804W"));
    }

    #[test]
    fn test_repl_input_commands() {
        assert_eq!(ReplInput::parse(":q", 0), ReplInput::Quit);
        assert_eq!(
            ReplInput::parse(" :esc ", 3),
            ReplInput::Dismiss(ModalEvent::EscapePressed)
        );
        assert_eq!(
            ReplInput::parse(":close", 3),
            ReplInput::Dismiss(ModalEvent::CloseClicked)
        );
        assert_eq!(
            ReplInput::parse("  science fiction ", 3),
            ReplInput::Search("science fiction".to_string())
        );
    }

    #[test]
    fn test_repl_number_opens_only_existing_cards() {
        assert_eq!(ReplInput::parse("2", 3), ReplInput::Open(2));
        assert_eq!(ReplInput::parse("3", 3), ReplInput::Open(3));
        assert_eq!(ReplInput::parse("0", 3), ReplInput::Search("0".to_string()));
        assert_eq!(ReplInput::parse("4", 3), ReplInput::Search("4".to_string()));
        assert_eq!(
            ReplInput::parse("1984", 0),
            ReplInput::Search("1984".to_string())
        );
        assert_eq!(
            ReplInput::parse("1984", 50),
            ReplInput::Search("1984".to_string())
        );
    }

    #[test]
    fn test_normalize_work_key() {
        assert_eq!(normalize_work_key("OL45804W"), "/works/OL45804W");
        assert_eq!(normalize_work_key("works/OL45804W"), "/works/OL45804W");
        assert_eq!(normalize_work_key("/works/OL45804W"), "/works/OL45804W");
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
