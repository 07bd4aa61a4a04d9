use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pool_standings::api::{build_router, state::AppState};
use pool_standings::bracket::BracketAdvancer;
use pool_standings::config::AppConfig;
use pool_standings::models::{GameId, GameStage, ResultType, ScoreEntry, Side, TournamentId};
use pool_standings::standings::{compute_pool_standings, PoolStandings};
use pool_standings::storage::{JsonlStore, StorageConfig, TournamentStore};

#[derive(Parser)]
#[command(name = "pool-standings")]
#[command(about = "Pool standings, tiebreakers and bracket advancement for tournaments")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },

    /// Print pool standings
    Standings {
        #[arg(long)]
        tournament: String,

        /// Only this pool ("A" or "Pool A")
        #[arg(long)]
        pool: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Record a final score and advance the bracket
    Score {
        #[arg(long)]
        tournament: String,

        #[arg(long)]
        game: String,

        #[arg(long)]
        home: u32,

        #[arg(long)]
        away: u32,

        #[arg(long, value_enum, default_value = "regulation")]
        result: ResultArg,

        /// Side that won in overtime or the shootout
        #[arg(long, value_enum)]
        winner: Option<SideArg>,

        #[arg(long)]
        pim_home: Option<u32>,

        #[arg(long)]
        pim_away: Option<u32>,

        /// Seconds until the home side's first goal
        #[arg(long)]
        first_goal_home: Option<u32>,

        #[arg(long)]
        first_goal_away: Option<u32>,
    },

    /// Re-run bracket advancement for a game
    Advance {
        #[arg(long)]
        tournament: String,

        #[arg(long)]
        game: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ResultArg {
    Regulation,
    Overtime,
    Shootout,
}

impl From<ResultArg> for ResultType {
    fn from(arg: ResultArg) -> Self {
        match arg {
            ResultArg::Regulation => ResultType::Regulation,
            ResultArg::Overtime => ResultType::Overtime,
            ResultArg::Shootout => ResultType::Shootout,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SideArg {
    Home,
    Away,
}

impl From<SideArg> for Side {
    fn from(arg: SideArg) -> Self {
        match arg {
            SideArg::Home => Side::Home,
            SideArg::Away => Side::Away,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    let log_level = cli.log_level.as_deref().unwrap_or(&config.log_level);

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::debug!("Starting pool-standings v{}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(JsonlStore::new(
        StorageConfig::new(config.data_dir.clone()),
        config.scoring_settings(),
    ));

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            let app = build_router(AppState::new(store));
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Standings {
            tournament,
            pool,
            json,
        } => {
            let tournament_id = TournamentId::from(tournament);
            let tables = load_standings(store.as_ref(), &tournament_id, pool.as_deref()).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&tables)?);
            } else {
                print_tables(&tables);
            }
        }
        Commands::Score {
            tournament,
            game,
            home,
            away,
            result,
            winner,
            pim_home,
            pim_away,
            first_goal_home,
            first_goal_away,
        } => {
            let tournament_id = TournamentId::from(tournament);
            let game_id = GameId::from(game);
            let mut record = store
                .game(&tournament_id, &game_id)
                .await?
                .with_context(|| format!("game {} not found in {}", game_id, tournament_id))?;

            let entry = ScoreEntry {
                home_score: home,
                away_score: away,
                result_type: result.into(),
                extra_time_winner: winner.map(Side::from),
                penalty_minutes_home: pim_home,
                penalty_minutes_away: pim_away,
                first_goal_seconds_home: first_goal_home,
                first_goal_seconds_away: first_goal_away,
            };
            entry.check(&record)?;
            record.apply_score(&entry);
            store.save_game(&record).await?;
            println!("Recorded {} {}-{} ({:?})", record.id, home, away, entry.result_type);

            let advancer = BracketAdvancer::new(store.clone());
            match advancer.on_game_scored(&tournament_id, &record.id).await {
                Ok(report) => println!("{}", serde_json::to_string_pretty(&report)?),
                Err(e) => tracing::warn!("Bracket advancement failed: {}", e),
            }
        }
        Commands::Advance { tournament, game } => {
            let advancer = BracketAdvancer::new(store.clone());
            let report = advancer
                .on_game_scored(&TournamentId::from(tournament), &GameId::from(game))
                .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

async fn load_standings(
    store: &dyn TournamentStore,
    tournament_id: &TournamentId,
    pool: Option<&str>,
) -> Result<Vec<PoolStandings>> {
    let mut pools = store.pools(tournament_id).await?;
    if let Some(label) = pool {
        pools.retain(|p| p.matches_label(label));
        anyhow::ensure!(!pools.is_empty(), "no pool {:?} in {}", label, tournament_id);
    }

    let pool_teams = store.pool_teams(tournament_id).await?;
    let games = store
        .games(tournament_id, Some(GameStage::PoolPlay))
        .await?;
    let rules = store.tiebreaker_rules(tournament_id).await?;
    let scoring = store.scoring(tournament_id).await?;

    Ok(compute_pool_standings(
        &pools,
        &pool_teams,
        &games,
        &rules,
        &scoring,
    ))
}

fn print_tables(tables: &[PoolStandings]) {
    for table in tables {
        println!("\n=== {} ===", table.pool.label());
        println!(
            "{:>3}  {:<24} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4} {:>4} {:>4}  Tiebreaker",
            "#", "Team", "GP", "W", "L", "T", "PTS", "GF", "GA", "GD"
        );
        for row in &table.standings {
            let s = &row.standing;
            let marker = if row.advancing { "*" } else { " " };
            let tiebreaker = s.tiebreaker_used.as_deref().unwrap_or("");
            println!(
                "{:>2}{} {:<24} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4} {:>4} {:>4}  {}",
                s.rank, marker, s.team_name, s.gp, s.w, s.l, s.t, s.pts, s.gf, s.ga, s.gd, tiebreaker
            );
        }
    }
}
