mod client;
mod output;
mod telemetry;

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracehead_core::ask::{AskRequest, Conversation};
use tracehead_core::config::Config;
use tracehead_core::format::{DefaultFormatter, TimeZoneMode};
use tracehead_core::header::TraceHeader;
use tracehead_core::jaeger::{read_traces, select_trace};
use tracehead_core::view_range::{
    Phase, TimelineEvent, ViewRange, ViewRangeListener, ViewRangeTimeUpdate,
};

use crate::client::{HttpAnswerer, QuestionAnswerer};
use crate::output::{
    print_conversation_human, print_header_human, print_selection_human, print_views_human,
};
use crate::telemetry::{init_tracing, shutdown_tracing};

#[derive(Parser, Debug)]
#[command(name = "tracehead")]
#[command(about = "Summarize a Jaeger trace and drive its time-range selection")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    json: bool,

    #[arg(long, global = true, help = "Trace id to pick from a multi-trace document")]
    trace: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Print the trace header: title, summary and selected range")]
    Header {
        file: PathBuf,
        #[arg(long)]
        view: Option<String>,
        #[arg(long)]
        hide_summary: bool,
        #[arg(long)]
        hide_map: bool,
        #[arg(long)]
        slim: bool,
        #[arg(long, help = "Committed range as START:END fractions", allow_hyphen_values = true)]
        range: Option<String>,
        #[arg(long, help = "utc or local")]
        time_zone: Option<String>,
    },
    #[command(about = "Replay a minimap selection gesture")]
    Select {
        file: PathBuf,
        #[arg(long = "drag", help = "Preview range START:END, repeatable", allow_hyphen_values = true)]
        drags: Vec<String>,
        #[arg(long, help = "Final range START:END", allow_hyphen_values = true, conflicts_with = "release")]
        commit: Option<String>,
        #[arg(long, help = "Commit the last previewed range")]
        release: bool,
    },
    #[command(about = "List the views the header offers")]
    Views {
        file: PathBuf,
        #[arg(long)]
        view: Option<String>,
    },
    #[command(about = "Ask a question about the trace")]
    Ask {
        file: PathBuf,
        #[arg(short, long)]
        question: String,
        #[arg(long, default_value_t = 1)]
        hop: u8,
        #[arg(long)]
        endpoint: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();
    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = Config::load()?;

    match cli.command {
        Commands::Header {
            file,
            view,
            hide_summary,
            hide_map,
            slim,
            range,
            time_zone,
        } => {
            let time_zone = match time_zone {
                Some(tz) => tz.parse()?,
                None => cfg.time_zone,
            };
            let mut header = load_header(&file, cli.trace.as_deref(), &cfg, time_zone)?;
            let mut flags = header.flags();
            flags.hide_summary |= hide_summary;
            flags.hide_map |= hide_map;
            flags.slim_view |= slim;
            header.set_flags(flags);
            if let Some(view) = view {
                header.set_view_type(view.parse()?);
            }
            if let Some(range) = range {
                let (start, end) = parse_range(&range)?;
                header.on_timeline_event(TimelineEvent::Commit(ViewRangeTimeUpdate::range(
                    start, end,
                )));
            }

            let snapshot = header
                .snapshot()
                .context("header has no trace to show")?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print_header_human(&snapshot);
            }
            Ok(())
        }
        Commands::Select {
            file,
            drags,
            commit,
            release,
        } => {
            let mut header = load_header(&file, cli.trace.as_deref(), &cfg, cfg.time_zone)?;
            let log = Rc::new(RefCell::new(SelectionLog::default()));
            header
                .range_mut()
                .add_listener(Box::new(SelectionRecorder(Rc::clone(&log))));

            for drag in &drags {
                let (start, end) = parse_range(drag)?;
                header.on_timeline_event(TimelineEvent::Preview(ViewRangeTimeUpdate::range(
                    start, end,
                )));
            }
            if let Some(commit) = commit {
                let (start, end) = parse_range(&commit)?;
                header.on_timeline_event(TimelineEvent::Commit(ViewRangeTimeUpdate::range(
                    start, end,
                )));
            } else if release {
                header.on_timeline_event(TimelineEvent::Release);
            } else if !drags.is_empty() {
                tracing::info!("selection left uncommitted; committed range unchanged");
            }

            let log = log.borrow();
            let report = SelectionReport {
                previews: log.previews.clone(),
                committed: header.range().current_range(),
                phase: header.range().phase(),
                commits: log.commits,
            };
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_selection_human(&report);
            }
            Ok(())
        }
        Commands::Views { file, view } => {
            let mut header = load_header(&file, cli.trace.as_deref(), &cfg, cfg.time_zone)?;
            if let Some(view) = view {
                header.set_view_type(view.parse()?);
            }
            let alt = header.alt_view_options();
            if cli.json {
                let payload = serde_json::json!({
                    "active": header.view_type(),
                    "alternatives": alt,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_views_human(header.view_type(), &alt);
            }
            Ok(())
        }
        Commands::Ask {
            file,
            question,
            hop,
            endpoint,
        } => {
            let header = load_header(&file, cli.trace.as_deref(), &cfg, cfg.time_zone)?;
            let trace = header
                .trace()
                .context("header has no trace to ask about")?;
            let request = AskRequest::new(&trace.trace_id, &question, hop, &cfg.ask_method)?;
            let answerer = HttpAnswerer::new(
                endpoint.unwrap_or_else(|| cfg.ask_endpoint.clone()),
                cfg.ask_timeout,
            )?;
            let convo = ask_once(&answerer, request).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&convo)?);
            } else {
                print_conversation_human(&convo);
            }
            Ok(())
        }
    }
}

fn load_header(
    file: &Path,
    trace_id: Option<&str>,
    cfg: &Config,
    time_zone: TimeZoneMode,
) -> anyhow::Result<TraceHeader> {
    let traces = read_traces(file)?;
    let trace = select_trace(traces, trace_id)?;
    let mut header = TraceHeader::new(
        DefaultFormatter::new(time_zone),
        cfg.header_flags(),
        cfg.default_view,
    );
    header.set_trace(Some(Arc::new(trace)));
    Ok(header)
}

async fn ask_once<A: QuestionAnswerer>(
    answerer: &A,
    request: AskRequest,
) -> anyhow::Result<Conversation> {
    let mut convo = Conversation::new();
    convo.ask(&request.question);
    let response = answerer.ask(&request).await?;
    convo.answer(&response);
    Ok(convo)
}

fn parse_range(input: &str) -> anyhow::Result<(f64, f64)> {
    let (start, end) = input
        .split_once(':')
        .with_context(|| format!("range must be START:END, got {input}"))?;
    let start = start
        .trim()
        .parse::<f64>()
        .with_context(|| format!("bad range start in {input}"))?;
    let end = end
        .trim()
        .parse::<f64>()
        .with_context(|| format!("bad range end in {input}"))?;
    Ok((start, end))
}

#[derive(Debug, Default)]
struct SelectionLog {
    previews: Vec<ViewRange>,
    commits: usize,
}

struct SelectionRecorder(Rc<RefCell<SelectionLog>>);

impl ViewRangeListener for SelectionRecorder {
    fn on_preview(&mut self, preview: &ViewRange) {
        self.0.borrow_mut().previews.push(*preview);
    }

    fn on_commit(&mut self, _committed: &ViewRange) {
        self.0.borrow_mut().commits += 1;
    }
}

#[derive(Debug, Serialize)]
pub struct SelectionReport {
    pub previews: Vec<ViewRange>,
    pub committed: ViewRange,
    pub phase: Phase,
    pub commits: usize,
}
