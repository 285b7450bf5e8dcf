use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use services::{QuizRunner, SessionError};

mod commands;
mod config;
mod terminal;

use commands::{Command, HELP};
use config::Cli;
use terminal::TerminalSink;

enum Flow {
    Continue,
    Quit,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // stdout belongs to the quiz.
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let bank = cli.load_bank()?;
    let settings = cli.settings()?;
    let storage = cli.storage().await?;
    tracing::info!(db = %cli.db, questions = bank.len(), "starting quiz");

    let mut runner = QuizRunner::new(bank, settings, storage.history(), TerminalSink::new())
        .context("starting quiz session")?;
    println!("{HELP}");
    runner.start();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut confirm_clear = false;
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                if std::mem::take(&mut confirm_clear) {
                    confirm_clear_history(&mut runner, &line).await;
                    continue;
                }
                match Command::parse(&line) {
                    Some(Command::ClearHistory) => {
                        println!("Clear all score history? This cannot be undone. [y/N]");
                        confirm_clear = true;
                    }
                    Some(command) => {
                        if let Flow::Quit = dispatch(&mut runner, command).await {
                            break;
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => println!("Unknown command. `h` for help."),
                }
            }
            Some(event) = runner.next_timer_event() => {
                runner.handle_timer_event(event).await;
            }
        }
    }

    tracing::debug!("quiz closed");
    Ok(())
}

async fn dispatch(runner: &mut QuizRunner<TerminalSink>, command: Command) -> Flow {
    let result = match command {
        Command::Toggle(numbers) => toggle_numbers(runner, &numbers),
        Command::Submit => runner.submit().map(drop),
        Command::Next => runner.advance().await.map(drop),
        Command::Finish => runner.finish_early().await.map(drop),
        Command::Restart => runner.restart(),
        Command::Help => {
            println!("{HELP}");
            Ok(())
        }
        Command::Quit => return Flow::Quit,
        Command::ClearHistory => Ok(()),
    };
    report(result);
    Flow::Continue
}

fn toggle_numbers(
    runner: &mut QuizRunner<TerminalSink>,
    numbers: &[usize],
) -> Result<(), SessionError> {
    for number in numbers {
        let Some(id) = runner.session().option_order().get(number - 1).copied() else {
            println!("No option {number}.");
            continue;
        };
        runner.toggle_option(id)?;
    }
    Ok(())
}

async fn confirm_clear_history(runner: &mut QuizRunner<TerminalSink>, answer: &str) {
    if answer.trim().eq_ignore_ascii_case("y") {
        report(runner.clear_history().await);
    } else {
        println!("History kept.");
    }
}

/// Print errors the sink has not already reported.
fn report(result: Result<(), SessionError>) {
    match result {
        Ok(()) => {}
        Err(SessionError::EmptySelection | SessionError::TooManySelections(_)) => {}
        Err(err) => {
            tracing::debug!(error = %err, "command rejected");
            println!("{err}");
        }
    }
}
