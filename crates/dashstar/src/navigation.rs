use colored::Colorize;
use dashstar_core::view::NavAction;

use crate::prelude::{println, *};

/// Performs route transitions together with the site title they carry
pub trait NavigationGateway {
    fn navigate_with_title(&mut self, action: &NavAction) -> Result<()>;
}

/// Terminal navigator: reports every transition on stdout and mirrors the
/// site title into the terminal window title
#[derive(Debug, Default)]
pub struct TerminalNavigator {
    current: Option<NavAction>,
}

impl TerminalNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route and title of the last transition
    pub fn current(&self) -> Option<&NavAction> {
        self.current.as_ref()
    }
}

impl NavigationGateway for TerminalNavigator {
    fn navigate_with_title(&mut self, action: &NavAction) -> Result<()> {
        match self.current() {
            Some(previous) => log::debug!("navigate {} -> {}", previous.route, action.route),
            None => log::debug!("navigate to {}", action.route),
        }

        // OSC 0: set window title. Stripped by anstream when stdout is not a terminal.
        anstream::print!("{}", window_title(&action.title));
        println!("{}", format_transition(action));

        self.current = Some(action.clone());
        Ok(())
    }
}

fn window_title(title: &str) -> String {
    format!("\x1b]0;{title}\x07")
}

fn format_transition(action: &NavAction) -> String {
    format!(
        "{} {}  {}",
        "→".bright_cyan(),
        action.route.path().cyan().underline(),
        action.title.bright_white().bold()
    )
}
