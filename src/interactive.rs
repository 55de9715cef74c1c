//! Interactive prompting for command inputs not supplied as flags.

use std::io::{self, IsTerminal};

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};

use crate::error::AppError;

/// Source of answers for inputs the user did not pass on the command line.
/// `flag` names the equivalent command-line option for error messages.
pub trait Prompter {
    /// Pick one of `options`; returns its index.
    fn select(&self, message: &str, options: &[String], flag: &str) -> Result<usize, AppError>;

    /// Non-empty free text.
    fn text(&self, message: &str, flag: &str) -> Result<String, AppError>;

    /// Positive record count.
    fn count(&self, message: &str, default: Option<u32>, flag: &str) -> Result<u32, AppError>;
}

/// Parse a record count typed by the user.
pub fn parse_count(input: &str) -> Result<u32, AppError> {
    match input.trim().parse::<u32>() {
        Ok(0) => Err(AppError::validation("please enter a number greater than zero")),
        Ok(n) => Ok(n),
        Err(_) => Err(AppError::validation("please enter a number")),
    }
}

/// Asks on the terminal with dialoguer. When stdin is not a terminal every
/// question fails with a message pointing at the matching flag.
pub struct TerminalPrompter {
    interactive: bool,
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new(non_interactive: bool) -> Self {
        Self {
            interactive: !non_interactive && io::stdin().is_terminal(),
            theme: ColorfulTheme::default(),
        }
    }

    fn require_terminal(&self, flag: &str) -> Result<(), AppError> {
        if self.interactive {
            Ok(())
        } else {
            Err(AppError::validation(format!(
                "Missing {flag} (no terminal available to ask for it)"
            )))
        }
    }
}

impl Prompter for TerminalPrompter {
    fn select(&self, message: &str, options: &[String], flag: &str) -> Result<usize, AppError> {
        self.require_terminal(flag)?;
        if options.is_empty() {
            return Err(AppError::validation("Nothing to choose from"));
        }
        let choice = Select::with_theme(&self.theme)
            .with_prompt(message)
            .items(options)
            .default(0)
            .interact()?;
        Ok(choice)
    }

    fn text(&self, message: &str, flag: &str) -> Result<String, AppError> {
        self.require_terminal(flag)?;
        let answer: String = Input::with_theme(&self.theme)
            .with_prompt(message)
            .validate_with(|s: &String| -> Result<(), &str> {
                if s.trim().is_empty() {
                    Err("a value is required")
                } else {
                    Ok(())
                }
            })
            .interact_text()?;
        Ok(answer.trim().to_string())
    }

    fn count(&self, message: &str, default: Option<u32>, flag: &str) -> Result<u32, AppError> {
        self.require_terminal(flag)?;
        let mut input = Input::<String>::with_theme(&self.theme).with_prompt(message);
        if let Some(d) = default {
            input = input.default(d.to_string());
        }
        let answer = input
            .validate_with(|s: &String| -> Result<(), String> {
                parse_count(s).map(|_| ()).map_err(|e| e.to_string())
            })
            .interact_text()?;
        parse_count(&answer)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn counts_must_be_positive_numbers() {
        assert_eq!(parse_count("3").ok(), Some(3));
        assert_eq!(parse_count(" 10 ").ok(), Some(10));
        assert!(matches!(parse_count("0"), Err(AppError::Validation { .. })));
        assert!(matches!(parse_count("ten"), Err(AppError::Validation { .. })));
        assert!(matches!(parse_count("-2"), Err(AppError::Validation { .. })));
    }

    #[test]
    fn non_interactive_prompter_names_the_flag() {
        let prompter = TerminalPrompter::new(true);
        let err = prompter.text("Describe your product:", "--product").unwrap_err();
        assert!(err.to_string().contains("--product"));
        let err = prompter
            .count("Number of records to generate?", Some(1), "--count")
            .unwrap_err();
        assert!(err.to_string().contains("--count"));
    }
}
