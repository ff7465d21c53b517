//! Doomsday console process
//!
//! Reads console lines from stdin while polling the idgames link between
//! lines. Ctrl-C or end of input shuts down cleanly.
//!
//! Run with: cargo run -p deng_runtime
//!       or: cargo run --bin doomsday

use std::io::{self, BufRead, IsTerminal, Write};
use std::process::ExitCode;
use std::time::Duration;

use crossbeam_channel::{select, Receiver, Sender};
use deng_runtime::{App, Config};
use deng_shell::Output;

/// How often the link is polled while waiting for input
const POLL_INTERVAL: Duration = Duration::from_millis(100);

fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("doomsday: {}", err);
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_filter()))
        .init();
    config.log_summary();

    let mut app = match App::new(&config) {
        Ok(app) => app,
        Err(err) => {
            log::error!("Startup failed: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let (interrupt_tx, interrupts) = crossbeam_channel::bounded(1);
    if let Err(err) = ctrlc::set_handler(move || {
        let _ = interrupt_tx.try_send(());
    }) {
        log::warn!("Ctrl-C handler not installed: {}", err);
    }
    let (line_tx, lines) = crossbeam_channel::unbounded();
    spawn_stdin_reader(line_tx);

    let colored = io::stdout().is_terminal();
    print_output(&app.start(), colored);
    run(&mut app, &lines, &interrupts, colored);

    println!("Shutting down...");
    app.shutdown();
    ExitCode::SUCCESS
}

enum Wake {
    Line(String),
    Interrupted,
    InputClosed,
    Idle,
}

fn run(app: &mut App, lines: &Receiver<String>, interrupts: &Receiver<()>, colored: bool) {
    show_prompt(app);
    while app.is_running() {
        let wake = select! {
            recv(lines) -> line => line.map_or(Wake::InputClosed, Wake::Line),
            recv(interrupts) -> _ => Wake::Interrupted,
            default(POLL_INTERVAL) => Wake::Idle,
        };

        match wake {
            Wake::Line(line) => {
                print_output(&app.handle_line(&line), colored);
                if !app.is_running() {
                    break;
                }
                show_prompt(app);
            }
            Wake::Interrupted => {
                println!();
                log::info!("Interrupted");
                break;
            }
            Wake::InputClosed => break,
            Wake::Idle => {}
        }

        let events = app.poll_link();
        if !events.is_empty() {
            println!();
            print_output(&events, colored);
            show_prompt(app);
        }
    }
}

/// Forward stdin lines; dropping the sender at end of input ends the loop
fn spawn_stdin_reader(tx: Sender<String>) {
    let spawned = std::thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        log::error!("Reading stdin: {}", err);
                        break;
                    }
                }
            }
        });
    if let Err(err) = spawned {
        log::error!("Failed to spawn the input thread: {}", err);
    }
}

fn show_prompt(app: &App) {
    print!("{}", app.prompt());
    let _ = io::stdout().flush();
}

fn print_output(output: &Output, colored: bool) {
    if output.is_empty() {
        return;
    }
    let text = if colored {
        output.format_colored()
    } else {
        output.format_plain()
    };
    println!("{}", text.trim_end());
}
