//! Events and logs commands - audit trail lookup and log search.

use anyhow::Result;
use cirrus_cloud::{EventQuery, TimeWindow, audit::parse_time};
use clap::Args;
use console::{Style, style};

use super::Context;
use crate::{output, wiring};

/// Arguments for the events command.
#[derive(Args, Debug)]
pub struct EventsArgs {
    /// Resource name to look up (e.g. an instance ID)
    pub resource: String,

    /// Only events touching this resource type (e.g. AWS::EC2::Instance)
    #[arg(long)]
    pub resource_type: Option<String>,

    /// Only events with this name (e.g. TerminateInstances)
    #[arg(long)]
    pub event_name: Option<String>,

    /// Window start (RFC 3339 or YYYY-MM-DDTHH:MM:SS, UTC)
    #[arg(long)]
    pub start: Option<String>,

    /// Window end (RFC 3339 or YYYY-MM-DDTHH:MM:SS, UTC)
    #[arg(long)]
    pub end: Option<String>,

    /// Maximum events to fetch
    #[arg(long, default_value_t = cirrus_cloud::audit::DEFAULT_MAX_EVENTS)]
    pub max_results: u32,
}

/// Arguments for the logs command.
#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Text to search for
    pub pattern: String,

    /// Log group to search (repeatable; defaults to [audit] log_groups)
    #[arg(long = "group")]
    pub groups: Vec<String>,

    /// Restrict to these log streams (repeatable)
    #[arg(long = "stream")]
    pub streams: Vec<String>,

    /// Window start (RFC 3339 or YYYY-MM-DDTHH:MM:SS, UTC; default 24h ago)
    #[arg(long)]
    pub start: Option<String>,

    /// Window end (default now)
    #[arg(long)]
    pub end: Option<String>,

    /// List streams active in the window instead of searching
    #[arg(long)]
    pub streams_only: bool,
}

/// Run the events command.
pub async fn run_events(args: EventsArgs, ctx: &Context) -> Result<()> {
    let audit = wiring::audit_log(ctx.config());

    let mut query = EventQuery::new(&args.resource)
        .with_start(args.start.as_deref().map(parse_time).transpose()?)
        .with_end(args.end.as_deref().map(parse_time).transpose()?)
        .with_max_results(args.max_results);
    if let Some(ref resource_type) = args.resource_type {
        query = query.with_resource_type(resource_type);
    }
    if let Some(ref event_name) = args.event_name {
        query = query.with_event_name(event_name);
    }

    let page = audit.lookup_events(&query).await?;

    if ctx.json_output {
        return output::print_json(&page);
    }

    if page.events.is_empty() {
        output::print_dim(&format!("No events found for {}", args.resource));
        return Ok(());
    }

    let dim = Style::new().dim();
    for event in &page.events {
        let time = event
            .event_time
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {}  {}",
            dim.apply_to(time),
            style(event.event_name.as_deref().unwrap_or("-")).bold(),
            event.username.as_deref().unwrap_or("-")
        );
    }
    if page.next_token.is_some() {
        output::print_dim("(more events available; raise --max-results)");
    }
    Ok(())
}

/// Run the logs command.
pub async fn run_logs(args: LogsArgs, ctx: &Context) -> Result<()> {
    let audit = wiring::audit_log(ctx.config());
    let window = TimeWindow::parse(args.start.as_deref(), args.end.as_deref())?;
    let groups = if args.groups.is_empty() {
        ctx.config().audit().log_groups
    } else {
        args.groups
    };

    if args.streams_only {
        let streams = audit.list_log_streams(&groups, window).await?;
        if ctx.json_output {
            return output::print_json(&streams);
        }
        for (group, streams) in &streams {
            println!("{}", style(group).bold());
            if streams.is_empty() {
                output::print_dim("  (no active streams)");
            }
            for stream in streams {
                println!("  {}", stream.name);
            }
        }
        return Ok(());
    }

    let matches = audit
        .search_logs(&args.pattern, &groups, window, &args.streams)
        .await;

    if ctx.json_output {
        return output::print_json(&matches);
    }
    if matches.is_empty() {
        output::print_dim(&format!("No log events matched '{}'", args.pattern));
        return Ok(());
    }
    for (group, messages) in &matches {
        println!("{}", style(group).bold());
        for message in messages {
            println!("  {}", message.trim_end());
        }
    }
    Ok(())
}
