use anyhow::Result;
use colored::{Color, Colorize};
use metricclock::prelude::*;
use metricclock::{ENGINE_NAME, VERSION as LIB_VERSION};
use rustyline::highlight::Highlighter;
use rustyline::Editor;
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use std::borrow::Cow;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SHELL_VERSION: &str = env!("CARGO_PKG_VERSION");
const CONFIG_PATH: &str = "metricclock";

/// Colours shell input by command family as it is typed.
#[derive(Completer, Helper, Hinter, Validator)]
struct CommandHighlighter;

/// The colour a command word is shown in; unknown words stay plain.
fn command_color(command: &str) -> Option<Color> {
    match command {
        "timer" => Some(Color::Magenta),
        "alarm" => Some(Color::Red),
        "mode" => Some(Color::Blue),
        "show" | "watch" | "test" => Some(Color::Green),
        "help" | "exit" => Some(Color::White),
        _ => None,
    }
}

impl Highlighter for CommandHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let Some(color) = command_color(command) else {
            return Cow::Borrowed(line);
        };
        let mut styled = command.color(color).bold().to_string();
        if line.len() > command.len() {
            // Arguments are numbers or free text; dim them so the command stands out.
            styled.push(' ');
            styled.push_str(&rest.color(color).dimmed().to_string());
        }
        Cow::Owned(styled)
    }
    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn print_banner() {
    if env::var("QUIET_MODE").is_ok() {
        return;
    }
    const LOGO_TEXT: &str = include_str!("../logo.log");
    println!("{}", LOGO_TEXT.cyan());
    println!(
        "  {} v{}  {}  {} v{}",
        "metricshell".bold(),
        SHELL_VERSION,
        "|".dimmed(),
        ENGINE_NAME.cyan(),
        LIB_VERSION
    );
    println!(
        "{}",
        "  10 hours a day, 100 minutes an hour, 100 seconds a minute. MIT OR Apache-2.0.".dimmed()
    );
    println!();
}

/// Numbers typed by the user; anything unparsable counts as zero.
fn parse_or_zero<T: std::str::FromStr + Default>(arg: Option<&&str>) -> T {
    arg.and_then(|s| s.parse().ok()).unwrap_or_default()
}

fn print_snapshot(snapshot: &ClockSnapshot) {
    let units = snapshot.day_mode.units();
    println!(
        "{}  {}",
        snapshot.reading.to_string().cyan().bold(),
        format!(
            "({} mode: 1 hour = {} minutes, 1 minute = {} seconds)",
            snapshot.day_mode, units.units_per_hour, units.units_per_minute
        )
        .dimmed()
    );
    println!(
        "  year {}  milliday {:03}",
        snapshot.reading.calendar_year, snapshot.reading.milliday_progress
    );
    if snapshot.timer.is_running() {
        println!("  timer running, {} left", snapshot.timer_display());
    } else {
        println!("  timer idle");
    }
    match snapshot.alarm {
        AlarmState::Unset => println!("  alarm not set"),
        AlarmState::Armed(target) => println!("  alarm set for {}:{:02}", target.hour, target.minute),
        AlarmState::Fired(target) => {
            println!("  alarm fired at {}:{:02}", target.hour, target.minute)
        }
    }
}

/// Spawns the tasks that surface engine output in the terminal.
fn spawn_event_listeners(engine: &MetricClockEngine, is_watching_clock: Arc<AtomicBool>) {
    // Notifications
    let mut event_rx = engine.subscribe_events();
    tokio::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(event) => println!(
                    "\n<-- [{}] {}\n>> ",
                    event.title().green().bold(),
                    event.message()
                ),
                Err(RecvError::Lagged(missed)) => {
                    println!("\n<-- [NOTIFY] {} notifications were dropped\n>> ", missed)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // System events
    let mut system_rx = engine.subscribe_system_events();
    tokio::spawn(async move {
        while let Ok(event) = system_rx.recv().await {
            println!("\n<-- [SYSTEM EVENT] {:?}\n>> ", event);
        }
    });

    // Live clock (controlled by the shared flag)
    let mut snapshot_rx = engine.subscribe_snapshots();
    tokio::spawn(async move {
        let mut last_printed = None;
        while snapshot_rx.changed().await.is_ok() {
            let snapshot = *snapshot_rx.borrow_and_update();
            if !is_watching_clock.load(Ordering::Relaxed) {
                continue;
            }
            if last_printed != Some(snapshot.reading) {
                last_printed = Some(snapshot.reading);
                println!("<-- [CLOCK] {}", snapshot.reading);
            }
        }
    });
}

fn print_help() {
    println!("Available commands:");
    println!("  show                  - Prints the clock, timer and alarm.");
    println!("  watch on|off          - Starts or stops printing the live clock.");
    println!("  timer start <S>       - Starts an S-second countdown.");
    println!("  timer stop            - Cancels the countdown.");
    println!("  alarm set <H> <M>     - Arms the alarm for H:M in the active units.");
    println!("  alarm clear           - Removes the alarm.");
    println!("  mode metric|standard  - Switches the day partition.");
    println!("  test <TITLE> [MSG]    - Sends a test notification.");
    println!("  exit                  - Quits the shell.");
}

#[tokio::main]
async fn main() -> Result<()> {
    print_banner();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let config = MetricClockConfig::load(CONFIG_PATH)?;
    let engine = MetricClockEngine::new(config);

    let is_watching_clock = Arc::new(AtomicBool::new(false));
    spawn_event_listeners(&engine, is_watching_clock.clone());

    info!("Starting {} in the background...", ENGINE_NAME);
    let state_loop = engine.start();

    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut rl = Editor::new()?;
    rl.set_helper(Some(CommandHighlighter));

    println!(
        "{} is running. Type 'help' for commands or 'exit' to quit.",
        ENGINE_NAME.cyan()
    );

    loop {
        let prompt = format!("{}", ">> ".cyan().bold());
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(_) => {
                println!("Exiting metricshell...");
                break;
            }
        };
        rl.add_history_entry(line.as_str())?;
        let args = line.split_whitespace().collect::<Vec<_>>();
        let Some(command) = args.first() else {
            continue;
        };

        match *command {
            "show" => print_snapshot(&engine.snapshot()),
            "watch" => match args.get(1) {
                Some(&"on") => {
                    is_watching_clock.store(true, Ordering::Relaxed);
                    println!("--> Started printing the live clock.");
                }
                Some(&"off") => {
                    is_watching_clock.store(false, Ordering::Relaxed);
                    println!("--> Stopped printing the live clock.");
                }
                _ => println!("Usage: watch on|off"),
            },
            "timer" => match args.get(1) {
                Some(&"start") => {
                    let seconds: u64 = parse_or_zero(args.get(2));
                    engine.start_timer(seconds).await;
                    println!("--> Timer started for {}.", format_countdown(seconds));
                }
                Some(&"stop") => {
                    engine.stop_timer().await;
                    println!("--> Timer stopped.");
                }
                _ => println!("Usage: timer start <SECONDS> | timer stop"),
            },
            "alarm" => match args.get(1) {
                Some(&"set") => {
                    let hour: u32 = parse_or_zero(args.get(2));
                    let minute: u32 = parse_or_zero(args.get(3));
                    engine.set_alarm(hour, minute);
                    println!("--> Alarm set for {}:{:02}.", hour, minute);
                }
                Some(&"clear") => {
                    engine.clear_alarm();
                    println!("--> Alarm cleared.");
                }
                _ => println!("Usage: alarm set <HOUR> <MINUTE> | alarm clear"),
            },
            "mode" => match args.get(1) {
                Some(&"metric") => engine.set_day_mode(DayMode::Metric),
                Some(&"standard") => engine.set_day_mode(DayMode::Standard),
                _ => println!("Usage: mode metric|standard (currently {})", engine.day_mode()),
            },
            "test" => match args.get(1) {
                Some(title) => engine.emit_test_event(*title, args[2..].join(" ")),
                None => println!("Usage: test <TITLE> [MESSAGE...]"),
            },
            "help" => print_help(),
            "exit" => break,
            _ => println!("Unknown command: '{}'. Type 'help'.", line.trim()),
        }
    }

    engine.shutdown().await;
    state_loop.await.ok();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparsable_numbers_become_zero() {
        let args = ["alarm", "set", "7", "x5"];
        assert_eq!(parse_or_zero::<u32>(args.get(2)), 7);
        assert_eq!(parse_or_zero::<u32>(args.get(3)), 0);
        assert_eq!(parse_or_zero::<u64>(args.get(9)), 0);
        assert_eq!(parse_or_zero::<u64>(Some(&"-3")), 0);
    }

    #[test]
    fn command_families_get_distinct_colors() {
        assert_eq!(command_color("timer"), Some(Color::Magenta));
        assert_eq!(command_color("alarm"), Some(Color::Red));
        assert_eq!(command_color("mode"), Some(Color::Blue));
        assert_eq!(command_color("bogus"), None);
    }

    #[test]
    fn unknown_input_is_left_unstyled() {
        let highlighted = CommandHighlighter.highlight("bogus 1 2", 0);
        assert!(matches!(highlighted, Cow::Borrowed("bogus 1 2")));
    }
}
