/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Displayed option numbers, 1-based.
    Toggle(Vec<usize>),
    Submit,
    Next,
    Finish,
    Restart,
    ClearHistory,
    Help,
    Quit,
}

impl Command {
    /// Parse a line; `None` if it is not a command.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let command = match line.to_ascii_lowercase().as_str() {
            "s" | "submit" => Self::Submit,
            "n" | "next" => Self::Next,
            "f" | "finish" => Self::Finish,
            "r" | "restart" => Self::Restart,
            "c" | "clear" => Self::ClearHistory,
            "h" | "help" | "?" => Self::Help,
            "q" | "quit" | "exit" => Self::Quit,
            _ => {
                let numbers = line
                    .split(|c: char| c.is_whitespace() || c == ',')
                    .filter(|t| !t.is_empty())
                    .map(str::parse::<usize>)
                    .collect::<Result<Vec<_>, _>>()
                    .ok()?;
                if numbers.is_empty() || numbers.contains(&0) {
                    return None;
                }
                Self::Toggle(numbers)
            }
        };
        Some(command)
    }
}

pub const HELP: &str = "\
Commands:
  1 3    toggle options by number
  s      submit the selection
  n      next question / see result
  f      finish the quiz now
  r      restart after finishing
  c      clear score history
  q      quit";
