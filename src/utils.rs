//! Utilities module.

use colored::Colorize;

/// Prints an error to the standard error output.
pub fn print_error<S: AsRef<str>>(error: S) {
    eprintln!("{} {}", "Error:".bold().red(), error.as_ref().red());
}

/// Prints a warning to the standard error output.
pub fn print_warning<S: AsRef<str>>(warning: S) {
    eprintln!("{} {}", "Warning:".bold().yellow(), warning.as_ref().yellow());
}
