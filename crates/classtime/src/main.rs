//! classtime - class scheduling host
//!
//! This is the main entry point for the classtime command-line host.
//! It wires together all the components:
//! - Configuration loading
//! - Clock selection (system, mock or fixed)
//! - Scheduling engine queries
//! - Instant-class countdown loop

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Days, Local, NaiveTime, TimeDelta, TimeZone};
use clap::{Parser, Subcommand};
use classtime_config::{Catalog, CURRENT_CONFIG_VERSION, load_config};
use classtime_core::{
    ClassPhase, InstantClassTracker, Occurrence, Schedule, TimerEvent, check_conflicts,
    next_occurrence, next_occurrence_within_window, occurrences_between, week_start,
};
use classtime_util::{
    Clock, FixedClock, SystemClock, default_config_path, format_clock_time, format_datetime_full,
    format_duration, is_mock_time_active, parse_local_datetime,
};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// classtime - Weekly class scheduling and instant-class timers
#[derive(Parser, Debug)]
#[command(name = "classtime")]
#[command(about = "Weekly class scheduling and instant-class timers", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/classtime/config.toml)
    #[arg(short, long, global = true, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Log level
    #[arg(short, long, global = true, default_value = "warn")]
    log_level: String,

    /// Evaluate at this local time instead of now ("YYYY-MM-DD HH:MM:SS")
    #[arg(long, global = true)]
    at: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the configuration and print a summary
    Validate,

    /// Check every schedule against the approved rest, on both axes
    Conflicts,

    /// Show the next occurrence of each approved schedule
    Next {
        /// Drop occurrences past a schedule's last month
        #[arg(long)]
        strict: bool,
    },

    /// List this week's approved occurrences in time order
    Week,

    /// Run an instant-class countdown until the class ends
    Timer {
        /// Class start ("YYYY-MM-DD HH:MM:SS"); defaults to now
        #[arg(long)]
        start: Option<String>,

        /// Label shown in log lines
        #[arg(long, default_value = "Instant class")]
        label: String,
    },
}

/// Loaded configuration plus the clock every query is evaluated against
struct Host {
    catalog: Catalog,
    clock: Box<dyn Clock>,
}

impl Host {
    fn new(args: &Args) -> Result<Self> {
        let catalog = load_config(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        info!(
            config_path = %args.config.display(),
            schedules = catalog.schedules.len(),
            classrooms = catalog.classrooms.len(),
            "Configuration loaded"
        );

        let clock: Box<dyn Clock> = match &args.at {
            Some(at) => Box::new(FixedClock::new(parse_time_arg(at)?)),
            None => Box::new(SystemClock),
        };

        if is_mock_time_active() {
            warn!("Mock time is active");
        }

        Ok(Self { catalog, clock })
    }

    fn validate(&self) {
        println!("✓ Configuration is valid (version {})", CURRENT_CONFIG_VERSION);
        println!(
            "  {} schedules ({} approved), {} classrooms",
            self.catalog.schedules.len(),
            self.catalog.approved().count(),
            self.catalog.classrooms.len()
        );
    }

    /// Returns the number of schedules with at least one clash
    fn conflicts(&self) -> usize {
        let mut clashing = 0;
        for schedule in &self.catalog.schedules {
            let report = check_conflicts(schedule, &self.catalog.schedules, Some(&schedule.id));
            if report.is_clear() {
                debug!(schedule = %schedule.id, "No conflicts");
                continue;
            }
            clashing += 1;
            println!("{} ({}): {}", self.describe(schedule), status(schedule), report);
        }
        if clashing == 0 {
            println!("No conflicts");
        }
        clashing
    }

    fn next(&self, strict: bool) {
        let now = self.clock.now();
        let strict = strict || self.catalog.host.strict_occurrences;

        for schedule in self.catalog.approved() {
            let found = if strict {
                next_occurrence_within_window(schedule, &now)
            } else {
                next_occurrence(schedule, &now)
            };
            match found {
                Some(occurrence) => println!(
                    "{}  {} (in {})",
                    format_datetime_full(&occurrence.at),
                    self.describe(schedule),
                    format_duration(until(&now, &occurrence.at))
                ),
                None => println!("{:19}  {}", "-", self.describe(schedule)),
            }
        }
    }

    fn week(&self) -> Result<()> {
        let now = self.clock.now();
        let monday = week_start(now.date_naive());
        let sunday_night = monday
            .checked_add_days(Days::new(7))
            .ok_or_else(|| anyhow!("Week after {} is out of range", monday))?;

        let from = local_midnight(monday)?;
        let to = local_midnight(sunday_night)?;

        let mut rows: Vec<(Occurrence<Local>, &Schedule)> = self
            .catalog
            .approved()
            .flat_map(|schedule| {
                occurrences_between(schedule, &from, &to)
                    .into_iter()
                    .map(move |occurrence| (occurrence, schedule))
            })
            .collect();
        rows.sort_by(|a, b| a.0.at.cmp(&b.0.at));

        println!("Week of {}", monday);
        for (occurrence, schedule) in rows {
            let marker = if occurrence.at <= now && now < occurrence.ends_at() {
                "*"
            } else {
                " "
            };
            println!(
                "{} {} {}-{}  {}",
                marker,
                occurrence.session.day,
                format_clock_time(&occurrence.at),
                format_clock_time(&occurrence.ends_at()),
                self.describe(schedule)
            );
        }
        Ok(())
    }

    async fn timer(&self, start: Option<&str>, label: &str) -> Result<()> {
        let base = self.clock.now();
        let class_start = match start {
            Some(s) => parse_time_arg(s)?,
            None => base,
        };

        let mut tracker = InstantClassTracker::new(label, class_start);
        let window = tracker.window().clone();
        println!(
            "{}: block {}-{}, attendance {}-{}",
            tracker.label(),
            format_clock_time(window.block_start()),
            format_clock_time(window.block_end()),
            format_clock_time(window.attendance_open()),
            format_clock_time(window.attendance_cutoff())
        );

        // Advance from the selected clock's instant at wall-clock pace
        let started = tokio::time::Instant::now();
        let elapsed_now = || {
            let elapsed = TimeDelta::from_std(started.elapsed()).unwrap_or(TimeDelta::zero());
            base + elapsed
        };

        let mut tick_timer = tokio::time::interval(self.catalog.host.tick_interval);
        let mut last_phase = None;

        info!(label = %label, "Timer running");

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Received Ctrl-C, stopping timer");
                    break;
                }

                _ = tick_timer.tick() => {
                    let now = elapsed_now();
                    for event in tracker.tick(&now) {
                        match event {
                            TimerEvent::AttendanceOpened { closes_in } => {
                                println!("Attendance open, closes in {}", format_duration(closes_in));
                            }
                            TimerEvent::ClassEnded { overrun } => {
                                debug!(overrun = ?overrun, "Class end observed");
                                println!("Class ended");
                            }
                        }
                    }

                    let reading = tracker.reading(&now);
                    if last_phase != Some(reading.phase) {
                        last_phase = Some(reading.phase);
                        debug!(phase = ?reading.phase, "Phase changed");
                    }
                    match reading.phase {
                        ClassPhase::InProgress => println!(
                            "[{:>3.0}%] in progress, attendance opens in {}, {} left",
                            reading.session_progress * 100.0,
                            format_duration(reading.attendance_opens_in.unwrap_or_default()),
                            format_duration(reading.session_remaining)
                        ),
                        ClassPhase::AttendanceOpen => println!(
                            "[{:>3.0}%] attendance open, {} left",
                            reading.session_progress * 100.0,
                            format_duration(reading.attendance_remaining.unwrap_or_default())
                        ),
                        ClassPhase::Ended => {}
                    }

                    if tracker.is_finished() {
                        break;
                    }
                }
            }
        }

        info!("Timer stopped");
        Ok(())
    }

    fn describe(&self, schedule: &Schedule) -> String {
        format!(
            "{} in {} by {}",
            schedule.subject,
            self.catalog.classroom_label(&schedule.classroom_id),
            schedule.tutor_id
        )
    }
}

fn status(schedule: &Schedule) -> &'static str {
    if schedule.approved { "approved" } else { "pending" }
}

fn until(now: &DateTime<Local>, at: &DateTime<Local>) -> std::time::Duration {
    (*at - *now).to_std().unwrap_or_default()
}

fn local_midnight(date: chrono::NaiveDate) -> Result<DateTime<Local>> {
    Local
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .ok_or_else(|| anyhow!("Midnight of {} does not exist locally", date))
}

fn parse_time_arg(s: &str) -> Result<DateTime<Local>> {
    parse_local_datetime(s)
        .ok_or_else(|| anyhow!("Invalid time '{}', expected YYYY-MM-DD HH:MM:SS", s))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "classtime starting");

    let host = Host::new(&args)?;

    match &args.command {
        Command::Validate => host.validate(),
        Command::Conflicts => {
            if host.conflicts() > 0 {
                std::process::exit(1);
            }
        }
        Command::Next { strict } => host.next(*strict),
        Command::Week => host.week()?,
        Command::Timer { start, label } => host.timer(start.as_deref(), label).await?,
    }

    Ok(())
}
