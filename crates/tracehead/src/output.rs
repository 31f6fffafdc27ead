use std::io::IsTerminal;

use owo_colors::OwoColorize;
use tracehead_core::ask::{Conversation, Speaker};
use tracehead_core::header::HeaderSnapshot;
use tracehead_core::view::TraceViewType;
use tracehead_core::view_range::ViewRange;

use crate::SelectionReport;

pub fn print_header_human(v: &HeaderSnapshot) {
    let color = std::io::stdout().is_terminal();
    if color {
        println!("{} {}", v.title.name.bold(), v.title.short_id.bright_black());
    } else {
        println!("{} {}", v.title.name, v.title.short_id);
    }

    if let Some(rows) = &v.summary {
        for row in rows {
            let label = format!("{:>12}", row.label);
            if color {
                println!("{}: {}", label.cyan(), row.value);
            } else {
                println!("{label}: {}", row.value);
            }
        }
    }

    println!(
        "view={} navigable={} minimap={}",
        v.view_type, v.search_navigable, v.show_minimap
    );
    if v.show_minimap {
        println!("range={}", range_label(&v.range));
    }
}

pub fn print_selection_human(v: &SelectionReport) {
    for preview in &v.previews {
        println!("preview {}", range_label(preview));
    }
    println!(
        "committed {} phase={:?} commits={}",
        range_label(&v.committed),
        v.phase,
        v.commits
    );
}

pub fn print_views_human(active: TraceViewType, alt: &[TraceViewType]) {
    println!("* {} ({})", active.label(), active);
    for view in alt {
        println!("  {} ({})", view.label(), view);
    }
}

pub fn print_conversation_human(convo: &Conversation) {
    for entry in convo.entries() {
        let speaker = match entry.speaker {
            Speaker::System => "System",
            Speaker::User => "User",
        };
        println!("{speaker}: {}", entry.content);
    }
}

fn range_label(range: &ViewRange) -> String {
    match range.time.cursor {
        Some(cursor) => format!(
            "[{:.3}, {:.3}] cursor={cursor:.3}",
            range.start(),
            range.end()
        ),
        None => format!("[{:.3}, {:.3}]", range.start(), range.end()),
    }
}
