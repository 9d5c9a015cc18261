use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use questmate::api::{self, AppState, SecurityConfig};
use questmate::catalog::Catalog;
use questmate::client::QuestClient;
use questmate::config::ExecutorConfig;
use questmate::db::Database;
use questmate::executor::ProcessExecutor;
use questmate::models::CurrentTask;

#[derive(Parser)]
#[command(name = "questmate")]
#[command(about = "Gamified coding practice with graded submissions, streaks and peer mentors")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the QuestMate server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// SQLite database file (defaults to the platform data directory)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Roadmap JSON file replacing the built-in catalog
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Per-submission execution timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Submit a source file for the user's current task
    Submit {
        #[arg(short, long)]
        user: String,

        /// File containing the solution
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Show a user's dashboard
    Dashboard {
        #[arg(short, long)]
        user: String,
    },
    /// List the skill tracks
    Skills {
        /// Roadmap JSON file replacing the built-in catalog
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "questmate=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_catalog(path: Option<&PathBuf>) -> anyhow::Result<Catalog> {
    let catalog = match path {
        Some(path) => Catalog::load(path)?,
        None => Catalog::builtin()?,
    };
    Ok(catalog)
}

async fn serve(
    host: String,
    port: u16,
    db_path: Option<PathBuf>,
    catalog_path: Option<PathBuf>,
    timeout_secs: Option<u64>,
) -> anyhow::Result<()> {
    let db = match db_path {
        Some(path) => Database::open(path)?,
        None => Database::open_default()?,
    };
    db.migrate()?;

    let catalog = Arc::new(load_catalog(catalog_path.as_ref())?);

    let mut exec_config = ExecutorConfig::from_env();
    if let Some(secs) = timeout_secs.filter(|&s| s > 0) {
        exec_config.timeout = Duration::from_secs(secs);
    }
    tracing::info!(
        interpreter = %exec_config.program,
        timeout_secs = exec_config.timeout.as_secs(),
        "Submissions run with {}",
        exec_config.program
    );
    let executor = Arc::new(ProcessExecutor::from_config(&exec_config));

    let state = AppState::new(db, catalog, executor);
    let app = api::create_router(state, SecurityConfig::from_env());

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    tracing::info!("QuestMate server listening on http://{}:{}", host, port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Serve {
            port,
            host,
            db,
            catalog,
            timeout_secs,
        }) => serve(host, port, db, catalog, timeout_secs).await?,
        Some(Commands::Submit { user, file }) => {
            let code = std::fs::read_to_string(&file)?;
            let result = QuestClient::from_env().submit(&user, &code).await?;

            println!("{}", result.message);
            if let Some(level) = result.new_level {
                println!("+{} XP, now level {}", result.xp_awarded, level);
            }
            if let Some(bonus) = &result.bonus {
                println!("{}", bonus);
            }
            println!("Streak: {}", result.streak_count);

            if !result.success {
                std::process::exit(1);
            }
        }
        Some(Commands::Dashboard { user }) => {
            let dashboard = QuestClient::from_env().dashboard(&user).await?;
            let u = &dashboard.user;

            println!("{} ({})", u.username, u.college);
            println!(
                "XP: {}  Streak: {}  Shields: {}",
                u.experience_points, u.streak_count, u.shield_count
            );
            if let Some(until) = u.shield_paused_until {
                println!("Paused until {}", until);
            }
            match &dashboard.current_task {
                CurrentTask::Unselected => println!("No skill selected"),
                CurrentTask::Active { level, task } => {
                    let skill = u.current_skill.as_deref().unwrap_or_default();
                    println!("{} level {}: {}", skill, level, task.title);
                    println!("{}", task.prompt);
                }
                CurrentTask::Mastered { level } => {
                    println!("Skill mastered at level {}", level);
                }
            }
            for mentor in &dashboard.mentors {
                println!(
                    "Mentor: {} (level {}, {} XP, {})",
                    mentor.name, mentor.level, mentor.xp, mentor.college
                );
            }
        }
        Some(Commands::Skills { catalog }) => {
            let catalog = load_catalog(catalog.as_ref())?;
            for skill in catalog.skills() {
                println!(
                    "{} {:<8} {:>3} tasks  {}",
                    skill.icon, skill.name, skill.task_count, skill.description
                );
            }
        }
        None => serve("127.0.0.1".into(), 3000, None, None, None).await?,
    }

    Ok(())
}
