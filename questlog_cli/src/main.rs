use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use questlog_core::*;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "questlog")]
#[command(about = "Habit quest log with optimistic local stats", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log an occurrence of a habit
    Log {
        /// Habit id (see `questlog habit list`)
        habit: String,

        /// Logged value (minutes, amount, count; ignored for boolean habits)
        #[arg(long)]
        value: Option<f64>,

        /// Subjective effort multiplier (0.5 / 1 / 2, ...)
        #[arg(long, default_value_t = 1.0)]
        intensity: f64,

        /// Free-text note stored with the log
        #[arg(long)]
        note: Option<String>,

        /// Attribute the log to this date (YYYY-MM-DD) instead of today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Reuse a log id when retrying a submission
        #[arg(long)]
        id: Option<Uuid>,
    },

    /// Show the quest board and hero profile (default)
    Status {
        /// Include archived habits
        #[arg(long)]
        all: bool,
    },

    /// Manage habit definitions
    Habit {
        #[command(subcommand)]
        action: HabitCommands,
    },

    /// Roll up WAL logs to the CSV archive
    Rollup {
        /// Clean up processed WAL files after rollup
        #[arg(long)]
        cleanup: bool,
    },

    /// Rebuild the stats book from the full log history
    Recompute {
        /// Show the rebuilt stats without saving them
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
enum HabitCommands {
    /// List habit definitions
    List {
        /// Include archived habits
        #[arg(long)]
        all: bool,
    },

    /// Create or update a habit
    Add {
        /// Stable habit id (e.g. "pushups")
        id: String,

        /// Display name
        name: String,

        /// Metric: boolean, time, money, or count
        #[arg(long, default_value = "boolean")]
        metric: String,

        /// Experience per unit of logged value
        #[arg(long, default_value_t = 10.0)]
        xp: f64,

        /// Display unit ("mins", "$", ...)
        #[arg(long)]
        unit: Option<String>,

        /// Grouping label ("Body", "Mind", ...)
        #[arg(long, default_value = "")]
        category: String,

        /// Display color hex
        #[arg(long)]
        color: Option<String>,
    },

    /// Archive a habit (hidden from the board, history kept)
    Archive { id: String },

    /// Reactivate an archived habit
    Restore { id: String },
}

/// File layout under the data directory
struct Paths {
    habits: PathBuf,
    stats: PathBuf,
    wal_dir: PathBuf,
    wal: PathBuf,
    csv: PathBuf,
}

impl Paths {
    fn new(data_dir: &PathBuf) -> Self {
        let wal_dir = data_dir.join("wal");
        Self {
            habits: data_dir.join("habits.json"),
            stats: data_dir.join("stats.json"),
            wal: wal_dir.join("logs.wal"),
            wal_dir,
            csv: data_dir.join("logs.csv"),
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    questlog_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let paths = Paths::new(&data_dir);

    match cli.command {
        Some(Commands::Log {
            habit,
            value,
            intensity,
            note,
            date,
            id,
        }) => cmd_log(&paths, &config, habit, value, intensity, note, date, id),
        Some(Commands::Status { all }) => cmd_status(&paths, all),
        Some(Commands::Habit { action }) => cmd_habit(&paths, action),
        Some(Commands::Rollup { cleanup }) => cmd_rollup(&paths, cleanup),
        Some(Commands::Recompute { dry_run }) => cmd_recompute(&paths, &config, dry_run),
        None => cmd_status(&paths, false),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_log(
    paths: &Paths,
    config: &Config,
    habit_id: String,
    value: Option<f64>,
    intensity: f64,
    note: Option<String>,
    date: Option<NaiveDate>,
    id: Option<Uuid>,
) -> Result<()> {
    std::fs::create_dir_all(&paths.wal_dir)?;

    let catalog = HabitCatalog::load(&paths.habits)?;
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::Catalog("Invalid catalog".into()));
    }

    let book = StatsBook::load(&paths.stats)?;
    let mut engine = Engine::new(catalog, book, &config.engine);
    let mut sink = JsonlSink::new(&paths.wal);

    let request = LogRequest {
        habit_id,
        value: value.unwrap_or(1.0),
        intensity,
        note,
        backdate: date,
        id,
    };

    match engine.submit_log(request, &mut sink)? {
        Outcome::Logged(logged) => {
            engine.into_book().save(&paths.stats)?;

            println!("✓ Logged! +{:.0} XP", logged.earned_xp);
            if logged.stats.streak > 0 {
                println!("  🔥 {} day streak (best {})", logged.stats.streak, logged.stats.best_streak);
            }
            if !logged.synced {
                println!("  ⚠ Saved locally, but the log archive write failed.");
            }
        }
        Outcome::Duplicate { id } => {
            println!("Duplicate submission suppressed (log id {})", id);
        }
    }

    Ok(())
}

fn cmd_status(paths: &Paths, all: bool) -> Result<()> {
    let catalog = HabitCatalog::load(&paths.habits)?;
    let book = StatsBook::load(&paths.stats)?;

    let mut habits: Vec<_> = if all {
        catalog.habits.values().collect()
    } else {
        catalog.active_habits()
    };
    habits.sort_by(|a, b| a.id.cmp(&b.id));

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  QUEST BOARD");
    println!("╰─────────────────────────────────────────╯");

    if habits.is_empty() {
        println!("\n  No active habits. Add one with `questlog habit add`.\n");
        return Ok(());
    }

    for habit in habits {
        let stats = book.get_or_default(&habit.id);
        let flame = if stats.streak > 0 { "🔥" } else { "🌑" };
        let archived = if habit.active { "" } else { " [archived]" };

        println!();
        println!("  {} {}{}", metric_icon(habit.metric), habit.name, archived);
        println!(
            "     {} {} day streak (best {})   ⭐ {:.0} XP",
            flame, stats.streak, stats.best_streak, stats.total_xp
        );
        match &habit.unit {
            Some(unit) => println!("     total: {:.1} {}", stats.total_volume, unit),
            None => println!("     total: {:.0} completions", stats.total_volume),
        }
    }

    let xp = profile::global_xp(&book);
    let level = profile::level_for_xp(xp);
    println!();
    println!("─────────────────────────────────────────");
    println!(
        "  Level {}   {:.0} XP / {:.0} XP ({:.0}%)",
        level,
        xp,
        profile::level_threshold(level + 1),
        profile::level_progress(xp)
    );
    println!();

    Ok(())
}

fn cmd_habit(paths: &Paths, action: HabitCommands) -> Result<()> {
    match action {
        HabitCommands::List { all } => {
            let catalog = HabitCatalog::load(&paths.habits)?;
            let mut habits: Vec<_> = catalog.habits.values().collect();
            habits.sort_by(|a, b| a.id.cmp(&b.id));

            for habit in habits {
                if !all && !habit.active {
                    continue;
                }
                let state = if habit.active { "active" } else { "archived" };
                println!(
                    "{:<16} {:<20} {:?} × {}  [{}]",
                    habit.id, habit.name, habit.metric, habit.xp_multiplier, state
                );
            }
            Ok(())
        }

        HabitCommands::Add {
            id,
            name,
            metric,
            xp,
            unit,
            category,
            color,
        } => {
            let metric = parse_metric(&metric)?;
            let mut catalog = HabitCatalog::load(&paths.habits)?;
            catalog.upsert(Habit {
                id: id.clone(),
                name,
                category,
                metric,
                xp_multiplier: xp,
                unit,
                color,
                active: true,
            })?;
            catalog.save(&paths.habits)?;

            println!("✓ Saved habit '{}'", id);
            Ok(())
        }

        HabitCommands::Archive { id } => {
            let mut catalog = HabitCatalog::load(&paths.habits)?;
            catalog.archive(&id)?;
            catalog.save(&paths.habits)?;

            println!("✓ Archived '{}' (history kept)", id);
            Ok(())
        }

        HabitCommands::Restore { id } => {
            let mut catalog = HabitCatalog::load(&paths.habits)?;
            catalog.restore(&id)?;
            catalog.save(&paths.habits)?;

            println!("✓ Restored '{}'", id);
            Ok(())
        }
    }
}

fn cmd_rollup(paths: &Paths, cleanup: bool) -> Result<()> {
    if !paths.wal.exists() {
        println!("No WAL file found - nothing to roll up.");
        return Ok(());
    }

    let count = questlog_core::csv_rollup::wal_to_csv_and_archive(&paths.wal, &paths.csv)?;

    println!("✓ Rolled up {} logs to CSV", count);
    println!("  CSV: {}", paths.csv.display());

    if cleanup {
        let cleaned = questlog_core::csv_rollup::cleanup_processed_wals(&paths.wal_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed WAL files", cleaned);
        }
    }

    Ok(())
}

fn cmd_recompute(paths: &Paths, config: &Config, dry_run: bool) -> Result<()> {
    let catalog = HabitCatalog::load(&paths.habits)?;
    let logs = load_logs(&paths.wal, &paths.csv)?;

    if logs.is_empty() {
        println!("No log history found - nothing to recompute.");
        return Ok(());
    }

    let book = recompute_stats(&catalog, &logs, config.engine.day_start_offset_hours);

    println!(
        "✓ Replayed {} logs into stats for {} habits",
        logs.len(),
        book.stats.len()
    );
    for (habit_id, stats) in &book.stats {
        println!(
            "  {:<16} streak {} (best {}), {:.0} XP",
            habit_id, stats.streak, stats.best_streak, stats.total_xp
        );
    }

    if dry_run {
        println!("\n[Dry run - stats book not saved]");
        return Ok(());
    }

    book.save(&paths.stats)?;
    println!("  Saved: {}", paths.stats.display());

    Ok(())
}

fn metric_icon(metric: Metric) -> &'static str {
    match metric {
        Metric::Time => "⏳",
        Metric::Money => "💰",
        Metric::Count => "🔢",
        Metric::Boolean => "⚡",
    }
}

fn parse_metric(s: &str) -> Result<Metric> {
    match s.to_lowercase().as_str() {
        "bool" | "boolean" => Ok(Metric::Boolean),
        "time" => Ok(Metric::Time),
        "money" => Ok(Metric::Money),
        "count" => Ok(Metric::Count),
        other => Err(Error::Config(format!(
            "unknown metric '{}' (expected boolean, time, money, or count)",
            other
        ))),
    }
}
