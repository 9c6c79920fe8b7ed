//! Operator-facing console lines

use colored::Colorize;

/// Closing line printed on every terminal path
pub const EXIT_MESSAGE: &str = "Thanks for using the log collection tool.";

/// Plain progress notice
pub fn notice(message: impl AsRef<str>) {
    println!("{}", message.as_ref());
}

/// Green success line
pub fn success(message: impl AsRef<str>) {
    println!("{}", message.as_ref().green());
}

/// Red failure line
pub fn failure(message: impl AsRef<str>) {
    println!("{}", message.as_ref().red());
}

/// Print the closing courtesy line
pub fn farewell() {
    println!("{}", EXIT_MESSAGE);
}
