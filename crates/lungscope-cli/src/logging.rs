//! Status lines for the user. They all go to stderr so stdout only ever
//! carries command results.

use colored::{ColoredString, Colorize, CustomColor};

pub const LUNG_TEAL: CustomColor = CustomColor {
    r: 16,
    g: 185,
    b: 129,
};

fn status_line(level: ColoredString, message: &str) -> String {
    format!(
        "[{}] {}: {}",
        "lungscope".custom_color(LUNG_TEAL),
        level,
        message
    )
}

pub fn print_err(err_message: &str) {
    eprintln!("{}", status_line("error".red().bold(), err_message));
}

#[macro_export]
macro_rules! print_err {
    ($($arg:tt)*) => {
        $crate::logging::print_err(&format!($($arg)*));
    };
}

pub fn print_warn(warn_message: &str) {
    eprintln!("{}", status_line("warning".yellow().bold(), warn_message));
}

#[macro_export]
macro_rules! print_warn {
    ($($arg:tt)*) => {
        $crate::logging::print_warn(&format!($($arg)*));
    };
}

pub fn print_info(info_message: &str) {
    eprintln!("{}", status_line("info".cyan().bold(), info_message));
}

#[macro_export]
macro_rules! print_info {
    ($($arg:tt)*) => {
        $crate::logging::print_info(&format!($($arg)*));
    };
}

pub fn print_success(success_message: &str) {
    eprintln!("{}", status_line("success".green().bold(), success_message));
}

#[macro_export]
macro_rules! print_success {
    ($($arg:tt)*) => {
        $crate::logging::print_success(&format!($($arg)*));
    };
}
