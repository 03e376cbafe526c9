//! Human-readable rendering of session steps
//!
//! Every function returns a `String` so callers decide where it goes.

use comfy_table::{presets, Table};
use console::style;
use jiff::Timestamp;
use s3conn_core::{Checks, ListResult, ObjectContent, ObjectInfo, ObjectRef, StepOutcome};

/// Characters of a text body shown in the read result
const PREVIEW_CHARS: usize = 256;

/// Render one completed step
pub fn render_outcome(outcome: &StepOutcome, colors: bool) -> String {
    match outcome {
        StepOutcome::ListBuckets { buckets } => render_buckets(buckets, colors),
        StepOutcome::ListObjects { bucket, listing } => {
            render_listing(&format!("Objects in {bucket}"), listing, colors)
        }
        StepOutcome::ListObjectsAfterPut { bucket, listing } => {
            render_listing(&format!("Objects in {bucket} after upload"), listing, colors)
        }
        StepOutcome::PutObject { object, info } => render_put(object, info, colors),
        StepOutcome::GetObject { object, content } => render_get(object, content, colors),
        StepOutcome::DeleteObject { object } => {
            format!("{} {object}", heading("Deleted", colors))
        }
    }
}

/// Render the consistency checks
pub fn render_checks(checks: &Checks, colors: bool) -> String {
    [
        (checks.key_listed_after_put, "uploaded key appears in listing"),
        (checks.round_trip_intact, "content read back matches upload"),
    ]
    .iter()
    .map(|(ok, label)| format!("{} {label}", mark(*ok, colors)))
    .collect::<Vec<_>>()
    .join("\n")
}

fn render_buckets(buckets: &[ObjectInfo], colors: bool) -> String {
    let mut lines = vec![heading(&format!("Buckets ({})", buckets.len()), colors)];
    for bucket in buckets {
        lines.push(format!(
            "  [{}] {}/",
            format_time(bucket.last_modified),
            bucket.key
        ));
    }
    lines.join("\n")
}

fn render_listing(title: &str, listing: &ListResult, colors: bool) -> String {
    let mut title = format!("{title} ({})", listing.items.len());
    if listing.truncated {
        title.push_str(", truncated");
    }
    let title = heading(&title, colors);

    if listing.items.is_empty() {
        return format!("{title}\n  (empty)");
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_BORDERS_ONLY);
    table.set_header(vec!["Key", "Size", "Last Modified", "ETag"]);
    for item in &listing.items {
        table.add_row(vec![
            item.key.clone(),
            format_size(item),
            format_time(item.last_modified),
            item.etag.clone().unwrap_or_default(),
        ]);
    }

    format!("{title}\n{table}")
}

fn render_put(object: &ObjectRef, info: &ObjectInfo, colors: bool) -> String {
    let mut details = vec![format_size(info)];
    if let Some(etag) = &info.etag {
        details.push(format!("etag {etag}"));
    }
    if let Some(ct) = &info.content_type {
        details.push(ct.clone());
    }
    format!(
        "{} {object} ({})",
        heading("Uploaded", colors),
        details.join(", ")
    )
}

fn render_get(object: &ObjectRef, content: &ObjectContent, colors: bool) -> String {
    let info = &content.info;
    let mut lines = vec![
        format!("{} {object}", heading("Read", colors)),
        format!("  size:          {}", format_size(info)),
        format!("  last modified: {}", format_time(info.last_modified)),
    ];
    if let Some(etag) = &info.etag {
        lines.push(format!("  etag:          {etag}"));
    }
    if let Some(ct) = &info.content_type {
        lines.push(format!("  content type:  {ct}"));
    }
    lines.push(format!("  body:          {}", preview(content)));
    lines.join("\n")
}

fn preview(content: &ObjectContent) -> String {
    if content.data.is_empty() {
        return "<empty>".to_string();
    }
    match content.text() {
        Some(text) => {
            let mut shown: String = text.chars().take(PREVIEW_CHARS).collect();
            if shown.len() < text.len() {
                shown.push('…');
            }
            format!("{shown:?}")
        }
        None => format!("<binary, {} bytes>", content.data.len()),
    }
}

fn heading(text: &str, colors: bool) -> String {
    if colors {
        style(text).bold().to_string()
    } else {
        text.to_string()
    }
}

fn mark(ok: bool, colors: bool) -> String {
    match (ok, colors) {
        (true, true) => style("✓").green().to_string(),
        (false, true) => style("✗").red().to_string(),
        (true, false) => "✓".to_string(),
        (false, false) => "✗".to_string(),
    }
}

fn format_size(info: &ObjectInfo) -> String {
    info.size_human.clone().unwrap_or_else(|| "0 B".to_string())
}

fn format_time(ts: Option<Timestamp>) -> String {
    ts.map(|d| d.strftime("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "                   ".to_string())
}
