//! Terminal output for orbitmap commands
//!
//! Tables and node data go to stdout, diagnostics to stderr. Colors follow
//! NO_COLOR, CLICOLOR and CLICOLOR_FORCE.

use colored::Colorize;

/// Failure line on stderr, red "error:" prefix
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Non-fatal notice on stderr: rejected drops, at-risk nodes
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Completed document-level step (init, layout, drop)
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Result of one mutation, labelled with the operation name
pub fn action(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

/// Table header row
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Indented line under a header, e.g. one ring slot
pub fn detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {}", msg);
}

/// Plain data row
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}
