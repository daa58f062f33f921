//! CLI output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use crate::auth::{Decision, RequiredLevel, RoleCategory, SessionState, SessionStatus};

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn warn(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Format a session status as a colored string
pub fn format_status(status: SessionStatus) -> String {
    let text = status.to_string();
    match status {
        SessionStatus::Authenticated => text.green().to_string(),
        SessionStatus::Unauthenticated => text.red().to_string(),
        SessionStatus::Loading | SessionStatus::Uninitialized => text.yellow().to_string(),
    }
}

fn decision_color(decision: &Decision) -> Color {
    match decision {
        Decision::Allow => Color::Green,
        Decision::Redirect(_) => Color::Red,
        Decision::Pending => Color::Yellow,
    }
}

/// Print the stored session. The token itself is never shown.
pub fn print_session(state: &SessionState, category: RoleCategory) {
    println!("{}", "Session".bold().underline());
    println!();
    println!("  {} {}", "Status:".bold(), format_status(state.status()));

    let Some(user) = state.user() else {
        println!();
        info("No session stored. Log in with 'sessiongate login'");
        return;
    };

    println!("  {} {}", "User id:".bold(), user.id);
    println!("  {} {}", "Email:".bold(), user.email);
    println!("  {} {}", "Name:".bold(), user.name.as_deref().unwrap_or("-"));
    println!("  {} {}", "Role tag:".bold(), user.role.as_deref().unwrap_or("-"));
    println!("  {} {}", "Category:".bold(), category.to_string().cyan());
}

/// Print a table of guard decisions
pub fn print_decision_table(decisions: &[(RequiredLevel, Decision)]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Required level").fg(Color::Cyan),
            Cell::new("Decision").fg(Color::Cyan),
        ]);

    for (level, decision) in decisions {
        table.add_row(vec![
            Cell::new(level.as_str()),
            Cell::new(decision.to_string()).fg(decision_color(decision)),
        ]);
    }

    println!("{table}");
}
