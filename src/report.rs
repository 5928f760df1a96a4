//! Static HTML report over an event log.

use crate::event::{Event, count_by_kind};
use crate::fingerprint::Digest;
use crate::store::{StoreError, write_atomic};
use std::path::Path;
use tracing::debug;

const DIGEST_DISPLAY_LEN: usize = 16;
const CHART_JS_URL: &str = "https://cdn.jsdelivr.net/npm/chart.js";

const STYLE: &str = r#"
        body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; margin: 0; background: #f5f6f8; color: #222; }
        .container { max-width: 1100px; margin: 0 auto; padding: 24px; }
        header { border-bottom: 2px solid #2c3e50; margin-bottom: 24px; }
        h1 { color: #2c3e50; margin-bottom: 8px; }
        .summary { display: flex; gap: 16px; margin-bottom: 24px; }
        .stat { flex: 1; background: #fff; border-radius: 6px; padding: 16px; box-shadow: 0 1px 3px rgba(0,0,0,0.1); }
        .stat .value { font-size: 2em; font-weight: bold; }
        .stat .label { color: #666; text-transform: uppercase; font-size: 0.8em; }
        .chart-container { background: #fff; border-radius: 6px; padding: 16px; margin-bottom: 24px; box-shadow: 0 1px 3px rgba(0,0,0,0.1); }
        table { width: 100%; border-collapse: collapse; background: #fff; box-shadow: 0 1px 3px rgba(0,0,0,0.1); }
        th, td { padding: 8px 12px; border-bottom: 1px solid #eee; text-align: left; }
        th { background: #2c3e50; color: #fff; }
        td.digest { font-family: monospace; color: #555; }
        .event-type { font-weight: bold; padding: 2px 8px; border-radius: 4px; color: #fff; }
        .event-type.added { background: #27ae60; }
        .event-type.modified { background: #f39c12; }
        .event-type.deleted { background: #c0392b; }
        .no-events { background: #fff; border-radius: 6px; padding: 32px; text-align: center; color: #666; }
"#;

/// Renders the report for `events`. Same input, same output.
pub fn render(events: &[Event]) -> String {
    let counts = count_by_kind(events);

    let mut html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>File Integrity Monitor Report</title>
    <script src="{}"></script>
    <style>{}</style>
</head>
<body>
    <div class="container">
        <header>
            <h1>File Integrity Monitor</h1>
            <p>Integrity events recorded for the monitored tree.</p>
        </header>
        <section class="summary">
            <div class="stat"><div class="value">{}</div><div class="label">Total events</div></div>
"#,
        CHART_JS_URL,
        STYLE,
        events.len()
    );

    for (kind, count) in &counts {
        html.push_str(&format!(
            r#"            <div class="stat"><div class="value">{}</div><div class="label">{}</div></div>
"#,
            count, kind
        ));
    }
    html.push_str("        </section>\n");

    if events.is_empty() {
        html.push_str(
            r#"        <div class="no-events">No integrity events detected</div>
"#,
        );
    } else {
        html.push_str(&chart_section(&counts));
        html.push_str(&event_table(events));
    }

    html.push_str(
        r#"    </div>
</body>
</html>
"#,
    );

    html
}

pub fn write_report(events: &[Event], path: &Path) -> Result<(), StoreError> {
    write_atomic(render(events).as_bytes(), path)?;
    debug!("Report saved to {}", path.display());
    Ok(())
}

fn chart_section(counts: &[(crate::event::EventKind, usize)]) -> String {
    let labels = counts
        .iter()
        .map(|(kind, _)| format!("\"{}\"", kind))
        .collect::<Vec<_>>()
        .join(", ");
    let data = counts
        .iter()
        .map(|(_, count)| count.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r##"        <div class="chart-container">
            <canvas id="eventsChart"></canvas>
        </div>
        <script>
            new Chart(document.getElementById("eventsChart"), {{
                type: "bar",
                data: {{
                    labels: [{}],
                    datasets: [{{
                        label: "Events",
                        data: [{}],
                        backgroundColor: ["#27ae60", "#f39c12", "#c0392b"]
                    }}]
                }},
                options: {{ plugins: {{ legend: {{ display: false }} }}, scales: {{ y: {{ beginAtZero: true, ticks: {{ precision: 0 }} }} }} }}
            }});
        </script>
"##,
        labels, data
    )
}

fn event_table(events: &[Event]) -> String {
    let mut table = String::from(
        r#"        <table>
            <thead>
                <tr><th>Time</th><th>Type</th><th>Path</th><th>Old hash</th><th>New hash</th></tr>
            </thead>
            <tbody>
"#,
    );

    for event in events {
        table.push_str(&format!(
            r#"                <tr><td>{}</td><td><span class="event-type {}">{}</span></td><td>{}</td><td class="digest">{}</td><td class="digest">{}</td></tr>
"#,
            event.timestamp().format("%Y-%m-%d %H:%M:%S"),
            event.kind().as_str().to_lowercase(),
            event.kind(),
            escape_html(event.path()),
            short_digest(event.old_digest()),
            short_digest(event.new_digest()),
        ));
    }

    table.push_str(
        r#"            </tbody>
        </table>
"#,
    );
    table
}

fn short_digest(digest: Option<&Digest>) -> String {
    match digest {
        Some(digest) => format!("{}...", digest.short(DIGEST_DISPLAY_LEN)),
        None => "-".to_string(),
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
