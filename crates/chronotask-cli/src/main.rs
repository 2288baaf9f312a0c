use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "chronotask", version, about = "Task list with a pomodoro work timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add(commands::task::AddArgs),
    /// List tasks, newest first
    List(commands::task::ListArgs),
    /// Act on a task by the id shown in the last listing
    Id {
        /// Task id from the last `list`
        task_id: u32,
        #[command(subcommand)]
        action: commands::task::IdAction,
    },
    /// Set a config value by dot-separated key
    Set {
        /// Config key (e.g. "timer.work_duration")
        key: String,
        /// New value
        value: String,
    },
    /// Print a config value
    Get {
        /// Config key
        key: String,
    },
    /// Hours worked per day of a month
    Stats {
        year: i32,
        /// Month number, 1-12
        month: u32,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CHRONOTASK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Add(args) => commands::task::add(args),
        Commands::List(args) => commands::task::list(args),
        Commands::Id { task_id, action } => commands::task::run(task_id, action),
        Commands::Set { key, value } => commands::config::set(&key, &value),
        Commands::Get { key } => commands::config::get(&key),
        Commands::Stats { year, month } => commands::stats::run(year, month),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
