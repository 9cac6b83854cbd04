//! User-facing messages.

use console::style;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Info,
    Note,
    Warning,
    Error,
}

impl Message {
    pub fn render(self, text: &str) -> String {
        match self {
            Message::Info => format!("{} {text}", style("==>").green().bold()),
            Message::Note => format!("  {} {text}", style("->").blue().bold()),
            Message::Warning => format!("{} {text}", style("==> WARNING:").yellow().bold().for_stderr()),
            Message::Error => format!("{} {text}", style("==> ERROR:").red().bold().for_stderr()),
        }
    }
}

pub fn info(text: &str) {
    println!("{}", Message::Info.render(text));
}

pub fn note(text: &str) {
    println!("{}", Message::Note.render(text));
}

pub fn warning(text: &str) {
    eprintln!("{}", Message::Warning.render(text));
}

pub fn error(text: &str) {
    eprintln!("{}", Message::Error.render(text));
}

/// Plain stdout, for machine-readable output and summaries.
pub fn output(text: impl std::fmt::Display) {
    println!("{text}");
}
