//! Terminal styling utilities for the run output

use std::path::Path;
use std::time::Duration;

use console::{style, Emoji};

use crate::pipeline::AnalysisConfig;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static TREE: Emoji<'_, '_> = Emoji("🌲 ", "");
pub static FILTER: Emoji<'_, '_> = Emoji("🔎 ", "");

/// Print the application banner
pub fn print_banner(version: &str) {
    let banner = r#"
    ██╗     ███████╗ █████╗ ██████╗ ███████╗ ██████╗ ██████╗ ██████╗ ███████╗
    ██║     ██╔════╝██╔══██╗██╔══██╗██╔════╝██╔════╝██╔═══██╗██╔══██╗██╔════╝
    ██║     █████╗  ███████║██║  ██║███████╗██║     ██║   ██║██████╔╝█████╗
    ██║     ██╔══╝  ██╔══██║██║  ██║╚════██║██║     ██║   ██║██╔═══╝ ██╔══╝
    ███████╗███████╗██║  ██║██████╔╝███████║╚██████╗╚██████╔╝██║     ███████╗
    ╚══════╝╚══════╝╚═╝  ╚═╝╚═════╝ ╚══════╝ ╚═════╝ ╚═════╝ ╚═╝     ╚══════╝
    "#;

    println!();
    println!("{}", style(banner).cyan().bold());
    println!(
        "    {} {}",
        style("◎").magenta().bold(),
        style("Lead quality, segment by segment").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Print configuration card
pub fn print_config(input: &Path, output: &Path, config: &AnalysisConfig, skip_render: bool) {
    let box_width = 56;
    let line = "─".repeat(box_width - 2);

    println!("    ┌{}┐", line);
    println!(
        "    │ {}{}│",
        style("⚙️  Configuration").cyan().bold(),
        " ".repeat(box_width - 20)
    );
    println!("    ├{}┤", line);
    println!("    │  {} Input:  {:<39}│", FOLDER, truncate_path(input, 38));
    println!("    │  {} Output: {:<39}│", SAVE, truncate_path(output, 38));
    println!("    ├{}┤", line);
    println!(
        "    │  {} Partner min leads:        {:<21}│",
        FILTER,
        style(format!("> {}", config.aggregation.partner_min_leads)).yellow()
    );
    println!(
        "    │  {} Widget/partner min leads: {:<21}│",
        FILTER,
        style(format!("> {}", config.aggregation.widget_partner_min_leads)).yellow()
    );
    println!(
        "    │  {} Forest:                   {:<21}│",
        TREE,
        style(format!("{} trees, seed {}", config.forest.n_trees, config.forest.seed)).yellow()
    );
    println!(
        "    │  {} Images:                   {:<21}│",
        CHART,
        style(if skip_render { "skipped" } else { "png" }).yellow()
    );
    println!("    └{}┘", line);
    println!();
}

/// Print a step header with styling
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print the elapsed time of a step
pub fn print_step_time(elapsed: Duration) {
    println!(
        "      {}",
        style(format!("⏱  {:.2}s", elapsed.as_secs_f64())).dim()
    );
}

/// Print the final completion message
pub fn print_completion(output: &Path) {
    println!();
    println!(
        "    {} {} {}",
        ROCKET,
        style("Lead analysis complete!").green().bold(),
        style(format!("Outputs in {}", output.display())).dim()
    );
    println!();
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize, detail: Option<&str>) {
    if let Some(info) = detail {
        println!(
            "      Found {} {} {}",
            style(count).yellow().bold(),
            description,
            style(info).dim()
        );
    } else {
        println!("      Found {} {}", style(count).yellow().bold(), description);
    }
}

// Helper functions

fn truncate_path(path: &Path, max_len: usize) -> String {
    let path_str = path.display().to_string();
    truncate_string(&path_str, max_len)
}

fn truncate_string(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_string()
    } else {
        let tail: String = chars[chars.len() - (max_len - 3)..].iter().collect();
        format!("...{}", tail)
    }
}
