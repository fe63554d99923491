pub mod process;
pub mod report;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use report::DateStyle;
use tracing::level_filters::LevelFilter;
use uuid::Uuid;

use crate::{
    daemon::start_daemon,
    store::{JsonStore, StateStore},
    tracker::{
        heatmap::DEFAULT_HEAT_WEEKS,
        intentions::{add_intention, remove_intention},
        session::SessionTracker,
        settings::{update_settings, SettingsUpdate},
    },
    utils::{
        clock::DefaultClock,
        dir::create_application_default_path,
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Shamewatch", version, long_about = None)]
#[command(about = "Tracks how long this machine has been eating your life", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Start the tracking daemon in the background")]
    Init,
    #[command(
        about = "Run the daemon directly in current console. Used for creating a daemon internally and for debugging"
    )]
    Serve,
    #[command(about = "Stop a currently running daemon")]
    Stop,
    #[command(about = "Show whether tracking is active and the live timer")]
    Status,
    #[command(about = "Display the numbers: totals, streak, and how much of your remaining life is gone")]
    Stats,
    #[command(about = "Render an activity heat map of the last weeks")]
    Heatmap {
        #[arg(long, default_value_t = DEFAULT_HEAT_WEEKS as u8, value_parser = clap::value_parser!(u8).range(1..=52), help = "Number of week columns to render")]
        weeks: u8,
    },
    #[command(about = "List recorded sessions")]
    History {
        #[arg(
            long = "since",
            short,
            help = "Start of the range. Examples are \"yesterday\", \"1 hour ago\", \"15/03/2025\", \"12:00 16/03/2025\""
        )]
        since: Option<String>,
        #[arg(
            long = "until",
            short,
            help = "End of the range. Examples are \"yesterday\", \"1 hour ago\", \"15/03/2025\", \"12:00 16/03/2025\""
        )]
        until: Option<String>,
        #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
        date_style: DateStyle,
        #[arg(long, short, default_value_t = 15, help = "How many sessions to list")]
        limit: usize,
    },
    #[command(subcommand, about = "Declare or drop daily time commitments")]
    Intention(IntentionCommands),
    #[command(subcommand, about = "Show or change user settings")]
    Settings(SettingsCommands),
    #[command(about = "Wipe the whole session history, including any session in progress")]
    Clear {
        #[arg(long, help = "Skip the confirmation prompt")]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum IntentionCommands {
    #[command(about = "Declare an intention")]
    Add {
        description: String,
        #[arg(long, short, help = "Minutes per day you're committing to")]
        minutes: u32,
    },
    #[command(about = "Drop an intention by id")]
    Remove { id: Uuid },
    #[command(about = "List declared intentions")]
    List,
}

#[derive(Subcommand, Debug)]
enum SettingsCommands {
    #[command(about = "Show current settings")]
    Show,
    #[command(about = "Change settings. Only the options you pass change")]
    Set {
        #[arg(long, value_parser = clap::value_parser!(i32).range(1900..=2100))]
        birth_year: Option<i32>,
        #[arg(long, value_parser = clap::value_parser!(i32).range(1..=150))]
        life_expectancy: Option<i32>,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args
        .dir
        .clone()
        .map_or_else(create_application_default_path, Ok)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &app_dir, logging_level, args.log)?;

    match args.commands {
        Commands::Init => process::restart_daemon(args.dir),
        Commands::Stop => {
            process::kill_running_daemons();
            Ok(())
        }
        Commands::Serve => start_daemon(app_dir).await,
        command => {
            let store = JsonStore::new(app_dir.join("state"))?;
            match command {
                Commands::Status => {
                    report::print_status(&store).await;
                    Ok(())
                }
                Commands::Stats => {
                    report::print_stats(&store).await;
                    Ok(())
                }
                Commands::Heatmap { weeks } => {
                    report::print_heat_map(&store, weeks as usize).await;
                    Ok(())
                }
                Commands::History {
                    since,
                    until,
                    date_style,
                    limit,
                } => report::print_history(&store, since, until, date_style, limit).await,
                Commands::Intention(command) => run_intention_command(&store, command).await,
                Commands::Settings(command) => run_settings_command(&store, command).await,
                Commands::Clear { yes } => run_clear_command(store, yes).await,
                Commands::Init | Commands::Stop | Commands::Serve => unreachable!(),
            }
        }
    }
}

async fn run_intention_command(store: &JsonStore, command: IntentionCommands) -> Result<()> {
    match command {
        IntentionCommands::Add {
            description,
            minutes,
        } => {
            let intention = add_intention(store, &DefaultClock, &description, minutes).await?;
            println!(
                "Declared: {} ({}m/day). Hold yourself to it.",
                intention.description, intention.time_committed
            );
        }
        IntentionCommands::Remove { id } => {
            if remove_intention(store, id).await {
                println!("Dropped.");
            } else {
                println!("No intention with id {id}");
            }
        }
        IntentionCommands::List => report::print_intentions(store).await,
    }
    Ok(())
}

async fn run_settings_command(store: &JsonStore, command: SettingsCommands) -> Result<()> {
    match command {
        SettingsCommands::Show => {
            let settings = store.settings().await;
            println!("birth_year     \t{}", settings.birth_year);
            println!("life_expectancy\t{}", settings.life_expectancy);
        }
        SettingsCommands::Set {
            birth_year,
            life_expectancy,
        } => {
            if birth_year.is_none() && life_expectancy.is_none() {
                bail!("Nothing to change, pass --birth-year or --life-expectancy");
            }
            let settings = update_settings(
                store,
                SettingsUpdate {
                    birth_year,
                    life_expectancy,
                },
            )
            .await;
            println!(
                "Saved. Born {}, planning on {}.",
                settings.birth_year, settings.life_expectancy
            );
        }
    }
    Ok(())
}

async fn run_clear_command(store: JsonStore, yes: bool) -> Result<()> {
    if !yes && !confirm("Wipe the entire session history?")? {
        println!("Kept.");
        return Ok(());
    }

    let tracker = SessionTracker::new(store, Box::new(DefaultClock));
    tracker.clear_sessions().await;
    println!("Wiped. Clean slate, same habits.");
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    use std::io::Write;

    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}
