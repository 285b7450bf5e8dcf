use std::collections::HashMap;

use quiz_core::model::OptionId;
use quiz_core::time::format_duration;
use services::{Feedback, Notice, OptionState, QuestionView, RenderSink, ResultView, SessionProgress};

const BAR_WIDTH: usize = 20;

/// Plain-text rendering on stdout.
#[derive(Debug, Default)]
pub struct TerminalSink {
    view: Option<QuestionView>,
    states: HashMap<OptionId, OptionState>,
}

impl TerminalSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn number_of(&self, option: OptionId) -> Option<usize> {
        self.view
            .as_ref()?
            .options
            .iter()
            .position(|o| o.id == option)
            .map(|i| i + 1)
    }

    fn print_option(&self, number: usize, text: &str, state: OptionState) {
        let marker = match state {
            OptionState::Idle => "( )",
            OptionState::Selected => "(*)",
            OptionState::Correct => "[+]",
            OptionState::Incorrect => "[x]",
            OptionState::Disabled => "   ",
        };
        let mut lines = text.lines();
        println!("  {marker} {number}. {}", lines.next().unwrap_or_default());
        for line in lines {
            println!("         {line}");
        }
    }
}

impl RenderSink for TerminalSink {
    fn render_question(&mut self, view: &QuestionView) {
        self.states = view
            .options
            .iter()
            .map(|o| (o.id, OptionState::Idle))
            .collect();
        println!();
        println!("{}", view.text);
        if view.allows_multiple {
            println!("(select all that apply)");
        }
        for (i, option) in view.options.iter().enumerate() {
            self.print_option(i + 1, &option.text, OptionState::Idle);
        }
        println!("Toggle options by number, then `s` to submit.");
        self.view = Some(view.clone());
    }

    fn highlight(&mut self, option: OptionId, state: OptionState) {
        self.states.insert(option, state);
        if matches!(state, OptionState::Selected | OptionState::Idle) {
            if let Some(number) = self.number_of(option) {
                let verb = if state == OptionState::Selected {
                    "selected"
                } else {
                    "cleared"
                };
                println!("  {verb} {number}");
            }
        }
    }

    fn show_progress(&mut self, progress: &SessionProgress) {
        let filled = usize::from(progress.percent) * BAR_WIDTH / 100;
        println!(
            "Question {} of {} [{}{}] {}%",
            progress.position,
            progress.total,
            "#".repeat(filled),
            ".".repeat(BAR_WIDTH - filled),
            progress.percent
        );
    }

    fn show_timer(&mut self, remaining_secs: u32) {
        if remaining_secs % 300 == 0 || remaining_secs == 60 || remaining_secs <= 10 {
            println!("Time remaining: {}", format_duration(u64::from(remaining_secs)));
        }
    }

    fn show_feedback(&mut self, feedback: &Feedback) {
        if let Some(view) = &self.view {
            for (i, option) in view.options.iter().enumerate() {
                let state = self
                    .states
                    .get(&option.id)
                    .copied()
                    .unwrap_or(OptionState::Disabled);
                self.print_option(i + 1, &option.text, state);
            }
        }

        if feedback.correct {
            println!("Correct!");
        } else {
            println!("Incorrect.");
            println!("Correct answer:");
            for answer in &feedback.correct_answers {
                println!("{answer}");
            }
        }
        if feedback.is_last {
            println!("`n` to see the result.");
        } else {
            println!("`n` for the next question.");
        }
    }

    fn notify(&mut self, notice: Notice) {
        println!("{}", notice.message());
    }

    fn show_result(&mut self, result: &ResultView) {
        self.view = None;
        println!();
        println!("Your Score: {}/{}", result.score, result.total);
        println!("Time taken: {}", format_duration(result.duration_secs));

        if !result.history.is_empty() {
            println!();
            println!("Score History");
            println!("{:>3}  {:<9}  {:<12}  Date", "#", "Score", "Time Taken");
            for row in &result.history {
                println!(
                    "{:>3}  {:<9}  {:<12}  {}",
                    row.number,
                    format!("{} / {}", row.score, row.total),
                    format_duration(row.duration_secs),
                    row.completed_at
                );
            }
        }
        println!();
        println!("`r` to restart, `c` to clear history, `q` to quit.");
    }
}
