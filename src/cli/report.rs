use std::fmt::Display;

use ansi_term::{Colour, Style};
use anyhow::Result;
use chrono::{Datelike, Local, Utc};
use chrono_english::parse_date_string;
use clap::{CommandFactory, ValueEnum};

use crate::{
    store::StateStore,
    tracker::{
        heatmap::{heat_map, DayCell},
        intentions::committed_minutes,
        session::{resumable_elapsed, STALE_MARKER_CUTOFF},
        stats,
    },
    utils::time::{format_duration, format_timer},
};

use super::Args;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

pub async fn print_status<S: StateStore>(store: &S) {
    let marker = store.current_session().await;
    let now = Utc::now();

    match marker {
        Some(start) if now - start <= STALE_MARKER_CUTOFF => {
            println!(
                "Tracking\t{}\t(since {})",
                format_timer(resumable_elapsed(marker, now)),
                start.with_timezone(&Local).format("%H:%M:%S")
            );
        }
        Some(start) => {
            println!(
                "Idle\tfound a stale session marker from {}, the daemon probably died",
                start.with_timezone(&Local).format("%x %H:%M:%S")
            );
        }
        None => println!("Idle\tno open session, is the daemon running?"),
    }
}

/// The dashboard: totals, the mortality math, streak, and this week's bars.
pub async fn print_stats<S: StateStore>(store: &S) {
    let sessions = store.sessions().await;
    let settings = store.settings().await;
    let intentions = store.intentions().await;

    let now = Local::now();
    let open_elapsed = resumable_elapsed(store.current_session().await, Utc::now());

    let today = stats::today_total(&sessions, open_elapsed, now);
    let week = stats::week_total(&sessions, open_elapsed, now);
    let all_time = stats::all_time_total(&sessions, open_elapsed);

    let shame = Style::new().bold();

    println!("Today     \t{}", shame.paint(format_duration(today)));
    println!("This week \t{}", shame.paint(format_duration(week)));
    println!("All time  \t{}", shame.paint(format_duration(all_time)));
    println!();

    for (day, total) in stats::seven_day_series(&sessions, open_elapsed, now) {
        let minutes = total.num_minutes();
        // One block per started quarter hour, capped at a terminal-friendly width.
        let bar = "▇".repeat(((minutes + 14) / 15).min(24) as usize);
        println!("{}\t{:>4}m {}", day.format("%a"), minutes, bar);
    }
    println!();

    if all_time.is_zero() {
        println!("No data yet. The clock is ticking.");
        return;
    }

    let days = stats::days_wasted(all_time);
    let life = stats::life_percentage(all_time, &settings, now.year());
    let streak = stats::current_streak(&sessions, now.date_naive());

    println!(
        "Days gone \t{}",
        shame.paint(format!("{days:.2} days")),
    );
    println!(
        "Life spent\t{} of what's left (born {}, planning on {})",
        shame.paint(format!("{:.4}%", *life.clamped(100.))),
        settings.birth_year,
        settings.life_expectancy
    );
    println!("Streak    \t{streak} days in a row");

    if !intentions.is_empty() {
        println!(
            "Intentions\t{} declared, {}m/day promised",
            intentions.len(),
            committed_minutes(&intentions)
        );
    }
}

const HEAT_COLOURS: [u8; 5] = [238, 22, 28, 34, 40];

fn heat_cell(cell: &Option<DayCell>) -> String {
    match cell {
        None => "  ".to_string(),
        Some(cell) => Colour::Fixed(HEAT_COLOURS[cell.level as usize])
            .paint(if cell.level == 0 { "· " } else { "■ " })
            .to_string(),
    }
}

pub async fn print_heat_map<S: StateStore>(store: &S, weeks: usize) {
    let sessions = store.sessions().await;
    let grid = heat_map(&sessions, weeks, Local::now().date_naive());

    for day in 0..7 {
        let label = ["   ", "Mon", "   ", "Wed", "   ", "Fri", "   "][day];
        let row: String = grid.iter().map(|week| heat_cell(&week[day])).collect();
        println!("{label} {row}");
    }

    let legend: String = (0u8..=4)
        .map(|level| {
            Colour::Fixed(HEAT_COLOURS[level as usize])
                .paint("■ ")
                .to_string()
        })
        .collect();
    println!("    less {legend}more");
}

pub async fn print_history<S: StateStore>(
    store: &S,
    since: Option<String>,
    until: Option<String>,
    date_style: DateStyle,
    limit: usize,
) -> Result<()> {
    let now = Local::now();
    let dialect: chrono_english::Dialect = date_style.into();

    let since = match since.map(|s| parse_date_string(&s, now, dialect)) {
        Some(Ok(v)) => Some(v.with_timezone(&Utc)),
        Some(Err(e)) => {
            return Err(Args::command()
                .error(
                    clap::error::ErrorKind::ValueValidation,
                    format!("Failed to validate start date {e}"),
                )
                .into());
        }
        None => None,
    };
    let until = match until.map(|s| parse_date_string(&s, now, dialect)) {
        Some(Ok(v)) => Some(v.with_timezone(&Utc)),
        Some(Err(e)) => {
            return Err(Args::command()
                .error(
                    clap::error::ErrorKind::ValueValidation,
                    format!("Failed to validate end date {e}"),
                )
                .into());
        }
        None => None,
    };

    let sessions = store.sessions().await;
    let selected = sessions
        .iter()
        .filter(|s| since.map_or(true, |bound| s.start_time >= bound))
        .filter(|s| until.map_or(true, |bound| s.start_time <= bound))
        .collect::<Vec<_>>();

    // The log is newest-first already.
    for session in selected.iter().take(limit) {
        println!(
            "{}\t{}\t{}",
            session
                .start_time
                .with_timezone(&Local)
                .format("%x %H:%M:%S"),
            format_duration(session.duration),
            session.device_type,
        );
    }

    let summary = stats::summarize(&sessions);
    if summary.total_sessions > 0 {
        println!();
        println!(
            "{} sessions over {} days, {} total, longest {}, average {}",
            summary.total_sessions,
            summary.active_days,
            format_duration(summary.total_time),
            format_duration(summary.longest_session),
            format_duration(summary.average_session),
        );
    } else {
        println!("Nothing recorded yet.");
    }
    Ok(())
}

pub async fn print_intentions<S: StateStore>(store: &S) {
    let intentions = store.intentions().await;
    if intentions.is_empty() {
        println!("No intentions declared.");
        return;
    }

    for intention in &intentions {
        println!(
            "{}\t{:>4}m/day\t{}\t(declared {})",
            intention.id,
            intention.time_committed,
            intention.description,
            intention.created_at.with_timezone(&Local).format("%x"),
        );
    }
    println!(
        "\n{}m/day promised in total. How's that going?",
        committed_minutes(&intentions)
    );
}
