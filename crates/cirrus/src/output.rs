//! Terminal output: instance tables, command results, JSON.

use anyhow::Result;
use cirrus_types::{CommandResult, Instance, ReachabilityStatus};
use console::{Style, style};
use serde::Serialize;

/// Print any serializable value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Numbered instance table. The numbers are what `run #` refers to in chat.
pub fn print_instances(instances: &[Instance]) {
    if instances.is_empty() {
        println!("No instances found matching the criteria.");
        return;
    }

    let width = |f: fn(&Instance) -> &str, title: &str| {
        instances
            .iter()
            .map(|i| console::measure_text_width(f(i)))
            .chain(std::iter::once(title.len()))
            .max()
            .unwrap_or(0)
            + 2
    };
    let id_w = width(|i| &i.id, "ID");
    let name_w = width(|i| &i.name, "Name");
    let type_w = width(|i| &i.instance_type, "Type");
    let ip_w = width(|i| i.private_ip_display(), "Private IP");

    let header = format!(
        "{:<3} {:<id_w$} {:<name_w$} {:<type_w$} {:<ip_w$} {}",
        "#", "ID", "Name", "Type", "Private IP", "Reachability"
    );
    println!("{}", style(&header).bold());
    println!("{}", Style::new().dim().apply_to("─".repeat(header.len())));

    for (idx, instance) in instances.iter().enumerate() {
        println!(
            "{:<3} {:<id_w$} {:<name_w$} {:<type_w$} {:<ip_w$} {}",
            idx + 1,
            instance.id,
            instance.name,
            instance.instance_type,
            instance.private_ip_display(),
            reachability(instance.reachability)
        );
    }
}

fn reachability(status: ReachabilityStatus) -> String {
    let style = match status {
        ReachabilityStatus::Available => Style::new().green(),
        ReachabilityStatus::NotAvailable => Style::new().red(),
        ReachabilityStatus::Unknown => Style::new().yellow(),
    };
    style.apply_to(status.as_str()).to_string()
}

/// Status, then output and error sections when non-empty.
pub fn print_result(result: &CommandResult) {
    let status = if result.status.is_success() {
        Style::new().green()
    } else {
        Style::new().red()
    };
    println!("Status: {}", status.apply_to(result.status.as_str()));

    let dim = Style::new().dim();
    if !result.output.is_empty() {
        println!("{}", dim.apply_to("--- Output ---"));
        println!("{}", result.output.trim_end_matches('\n'));
    }
    if !result.error.is_empty() {
        println!("{}", dim.apply_to("--- Error ---"));
        println!("{}", result.error.trim_end_matches('\n'));
    }
}

pub fn print_dim(msg: &str) {
    println!("{}", Style::new().dim().apply_to(msg));
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", Style::new().red().apply_to("Error:"), msg);
}
