// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use quantrank::{
    list_firms, load_firm, CategoryFilter, ClientConfig, FirmId, FirmView, HttpRankingApi,
    MatchupController, UnavailableReason, VoteState,
};

const DEFAULT_LOG_FILTER: &str = "quantrank=info";

#[derive(Parser)]
#[command(name = "quantrank", version, about = "Which quant firm would you rather work at?")]
struct Cli {
    /// Ranking API base URL (overrides QUANTRANK_API_URL)
    #[arg(long, global = true)]
    api: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive matchups (default)
    Play,
    /// List all firms with their record
    Firms {
        /// Category, e.g. "Hedge Fund" or "all"
        #[arg(long = "type", default_value = "all")]
        firm_type: String,
    },
    /// Stats and comments for one firm
    Firm { id: i64 },
    /// Draw a single matchup
    Matchup,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.api {
        config = config.with_api_base(url);
    }

    match cli.command.unwrap_or(Commands::Play) {
        Commands::Play => run_ui_mode(&config),
        Commands::Firms { firm_type } => {
            init_stderr_logging();
            run_firms(&config, &CategoryFilter::parse(&firm_type))
        }
        Commands::Firm { id } => {
            init_stderr_logging();
            run_firm(&config, FirmId(id))
        }
        Commands::Matchup => {
            init_stderr_logging();
            run_matchup(&config)
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

fn connect(config: &ClientConfig) -> Result<HttpRankingApi> {
    HttpRankingApi::new(config.api_base.clone(), config.request_timeout)
        .with_context(|| format!("Could not set up client for {}", config.api_base))
}

// ============================================================================
// CLI MODE
// ============================================================================

fn run_firms(config: &ClientConfig, filter: &CategoryFilter) -> Result<()> {
    let api = connect(config)?;
    let firms = list_firms(&api, filter)?;

    println!("🏦 Firms ({})", filter.label());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if firms.is_empty() {
        println!("No firms found");
        return Ok(());
    }

    println!(
        "{:<34} {:<15} {:>9} {:>6} {:>7} {:>6}",
        "Firm", "Type", "Win Rate", "Wins", "Losses", "Total"
    );
    for firm in &firms {
        let rate = if firm.has_votes() {
            format!("{}%", firm.win_rate())
        } else {
            "No data".to_string()
        };
        println!(
            "{:<34} {:<15} {:>9} {:>6} {:>7} {:>6}",
            firm.name,
            firm.firm_type.as_str(),
            rate,
            firm.wins,
            firm.losses,
            firm.total
        );
    }
    println!("\n✓ {} firms", firms.len());

    Ok(())
}

fn run_firm(config: &ClientConfig, id: FirmId) -> Result<()> {
    let api = connect(config)?;

    let detail = match load_firm(&api, id) {
        FirmView::Found(detail) => detail,
        FirmView::NotFound(id) => bail!("Firm {} not found", id),
        FirmView::Unavailable(e) => bail!("Could not load firm {}: {}", id, e),
    };
    let firm = &detail.firm;

    println!("🏦 {} ({})", firm.name, firm.firm_type);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if firm.has_votes() {
        println!("Win Rate:    {}%", firm.win_rate());
        println!("Wins:        {}", firm.wins);
        println!("Losses:      {}", firm.losses);
        println!("Total Votes: {}", firm.total);
    } else {
        println!("No data available. Be the first to vote!");
    }

    println!("\n💬 Comments");
    if detail.comments.is_empty() {
        println!("   No comments yet");
    }
    for comment in &detail.comments {
        let against = comment
            .other_firm
            .as_deref()
            .map(|other| format!(" vs {}", other))
            .unwrap_or_default();
        println!("   {}{}  \"{}\"", comment.sentiment.badge(), against, comment.text);
    }

    Ok(())
}

fn run_matchup(config: &ClientConfig) -> Result<()> {
    let api = connect(config)?;
    let mut controller = MatchupController::new(config.recent_comments);

    let command = controller.request_matchup()?;
    controller.drive(command, &api);

    match controller.state() {
        VoteState::Presenting { matchup, .. } => {
            let (left, right) = (matchup.left(), matchup.right());
            println!("🥊 Which would you rather work at?\n");
            println!("   [{}] {} ({})", left.id, left.name, left.firm_type);
            println!("        vs");
            println!("   [{}] {} ({})", right.id, right.name, right.firm_type);
            Ok(())
        }
        VoteState::Unavailable { reason: UnavailableReason::NotEnoughFirms } => {
            bail!("Not enough firms for a matchup")
        }
        VoteState::Unavailable { reason: UnavailableReason::Transport(e) } => {
            bail!("Could not load a matchup: {}", e)
        }
        other => bail!("Unexpected matchup state: {}", other.name()),
    }
}

// ============================================================================
// UI MODE
// ============================================================================

#[cfg(feature = "tui")]
fn run_ui_mode(config: &ClientConfig) -> Result<()> {
    use quantrank::CareerRegistry;
    use std::sync::Arc;
    use tracing::info;
    use tracing_appender::rolling::{RollingFileAppender, Rotation};

    // The terminal belongs to the UI, so logs go to a file
    std::fs::create_dir_all(&config.log_dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix("quantrank.log")
        .build(&config.log_dir)
        .context("Could not open log file")?;
    let (writer, _guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .init();

    println!("🖥️  Loading QuantRank...\n");

    let careers = match &config.careers_file {
        Some(path) => CareerRegistry::load(path)
            .with_context(|| format!("Could not read careers file {}", path.display()))?,
        None => CareerRegistry::new(),
    };
    let api = connect(config)?;

    info!(api = %config.api_base, careers = careers.count(), "Starting UI");
    println!("✓ Ranking API: {}", config.api_base);
    println!("✓ Logging to {}", config.log_dir.join("quantrank.log").display());
    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(Arc::new(api), careers, config.recent_comments);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &ClientConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the CLI: quantrank firms | quantrank matchup");
    std::process::exit(1);
}
