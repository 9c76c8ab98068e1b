//! Terminal output utilities: ANSI formatting of report lines.

use bootforge_config::{Diagnostic, Report, Severity};

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

/// Print a formatted ERROR note.
pub fn note_error(msg: &str) {
    if supports_color() {
        eprintln!("{RED}{BOLD}✗{RESET} {msg}");
    } else {
        eprintln!("ERROR: {msg}");
    }
}

/// Print a formatted SUCCESS note.
pub fn note_success(msg: &str) {
    if supports_color() {
        println!("{GREEN}{BOLD}✓{RESET} {msg}");
    } else {
        println!("OK: {msg}");
    }
}

/// One report line: `error at $.storage.files[0].path: path not absolute`.
pub fn format_diagnostic(diagnostic: &Diagnostic, color: bool) -> String {
    if !color {
        return diagnostic.to_string();
    }
    let tint = match diagnostic.severity {
        Severity::Error => RED,
        Severity::Warning => YELLOW,
    };
    format!(
        "{tint}{BOLD}{}{RESET} {DIM}at{RESET} {}: {}",
        diagnostic.severity, diagnostic.path, diagnostic.message
    )
}

/// Every line of `report` followed by a summary line.
pub fn format_report(report: &Report, color: bool) -> String {
    let mut out = String::new();
    for diagnostic in report {
        out.push_str(&format_diagnostic(diagnostic, color));
        out.push('\n');
    }
    let errors = report.errors().count();
    let warnings = report.warnings().count();
    let summary = format!("{errors} error(s), {warnings} warning(s)");
    match (color, report.is_fatal()) {
        (false, _) => out.push_str(&summary),
        (true, true) => out.push_str(&format!("{RED}{BOLD}✗{RESET} {summary}")),
        (true, false) => out.push_str(&format!("{GREEN}{BOLD}✓{RESET} {summary}")),
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bootforge_config::ContextPath;

    fn report() -> Report {
        let mut report = Report::new();
        report.error(ContextPath::root().append("storage"), "broken");
        report.warn(ContextPath::root().append("passwd"), "odd");
        report
    }

    #[test]
    fn plain_output_matches_display() {
        assert_eq!(
            format_report(&report(), false),
            "error at $.storage: broken\nwarning at $.passwd: odd\n1 error(s), 1 warning(s)\n"
        );
    }

    #[test]
    fn colored_output_tints_by_severity() {
        let out = format_report(&report(), true);
        assert!(out.contains(&format!("{RED}{BOLD}error{RESET}")));
        assert!(out.contains(&format!("{YELLOW}{BOLD}warning{RESET}")));
        assert!(out.ends_with(&format!("{RED}{BOLD}✗{RESET} 1 error(s), 1 warning(s)\n")));
    }

    #[test]
    fn empty_report_is_a_pass() {
        assert_eq!(format_report(&Report::new(), false), "0 error(s), 0 warning(s)\n");
    }
}
