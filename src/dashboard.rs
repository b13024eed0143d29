// src/dashboard.rs
//! Static HTML dashboard of the currently open, relevant listings. Written
//! atomically next to the state file; a render failure never blocks the run.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::Path;

use crate::classify::{Classification, Priority};
use crate::listing::{Listing, Source};

/// One row of the dashboard: a listing with its classification attached.
#[derive(Debug, Clone)]
pub struct DashboardEntry {
    pub listing: Listing,
    pub classification: Classification,
}

/// Deadline within the next 7 days (inclusive), past deadlines excluded.
pub fn closing_soon(listing: &Listing, today: NaiveDate) -> bool {
    match listing.closing_date {
        Some(date) => {
            let days_left = (date - today).num_days();
            (0..=7).contains(&days_left)
        }
        None => false,
    }
}

pub fn render(entries: &[DashboardEntry], today: NaiveDate, last_updated: &str) -> String {
    let mut sorted: Vec<&DashboardEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| {
        (
            !closing_soon(&e.listing, today),
            e.classification.priority != Priority::High,
            e.listing.title.to_lowercase(),
        )
    });

    let total = sorted.len();
    let n_closing = sorted
        .iter()
        .filter(|e| closing_soon(&e.listing, today))
        .count();
    let n_high = sorted
        .iter()
        .filter(|e| e.classification.priority == Priority::High)
        .count();

    let mut html = String::with_capacity(16 * 1024);
    html.push_str(HEAD);
    html.push_str(&format!(
        r#"        <header>
            <h1>KI Research Position Tracker</h1>
            <p class="subtitle">PhD &amp; Research positions at Karolinska Institutet</p>
            <div class="stats">
                <div class="stat"><strong>{total}</strong> matching positions</div>
                <div class="stat"><strong>{n_closing}</strong> closing soon</div>
                <div class="stat"><strong>{n_high}</strong> high priority</div>
            </div>
        </header>
"#
    ));

    if sorted.is_empty() {
        html.push_str(
            r#"        <div class="section">
            <p class="empty">No matching positions found. Check back later!</p>
        </div>
"#,
        );
    } else {
        for source in Source::ALL {
            let section: Vec<&&DashboardEntry> =
                sorted.iter().filter(|e| e.listing.source == source).collect();
            if section.is_empty() {
                continue;
            }
            html.push_str(&format!(
                r#"        <div class="section">
            <h2>{} ({})</h2>
            <ul class="job-list">
"#,
                html_escape::encode_text(source.display_name()),
                section.len()
            ));
            for entry in section {
                push_job(&mut html, entry, today);
            }
            html.push_str(
                r#"            </ul>
        </div>
"#,
            );
        }
    }

    html.push_str(&format!(
        r#"        <footer>
            <p>Last updated: {}</p>
            <p>Subscribe to notifications: <a href="https://ntfy.sh/andrada-ki-jobs">ntfy.sh/andrada-ki-jobs</a></p>
        </footer>
    </div>
</body>
</html>
"#,
        html_escape::encode_text(last_updated)
    ));

    html
}

fn push_job(html: &mut String, entry: &DashboardEntry, today: NaiveDate) {
    let mut badges = String::new();
    if entry.classification.priority == Priority::High {
        badges.push_str(r#"<span class="badge badge-high">High Priority</span> "#);
    }
    if closing_soon(&entry.listing, today) {
        badges.push_str(r#"<span class="badge badge-closing">Closing Soon</span> "#);
    }

    let deadline_text = match &entry.listing.deadline {
        Some(d) => format!("Deadline: {}", html_escape::encode_text(d)),
        None => "Deadline: Not specified".to_string(),
    };

    let keywords: String = entry
        .classification
        .matched_keywords
        .iter()
        .map(|kw| {
            format!(
                r#"<span class="badge badge-keyword">{}</span>"#,
                html_escape::encode_text(kw)
            )
        })
        .collect();

    html.push_str(&format!(
        r#"                <li class="job">
                    <a href="{}" class="job-title" target="_blank">{}</a>
                    <div class="job-meta">
                        <span>{deadline_text}</span>
                        {badges}
                    </div>
                    <div class="keywords">{keywords}</div>
                </li>
"#,
        html_escape::encode_double_quoted_attribute(&entry.listing.url),
        html_escape::encode_text(&entry.listing.title),
    ));
}

/// Atomic write, same temp-then-rename dance as the state file.
pub fn write_dashboard(path: &Path, html: &str) -> Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let mut tmp = tempfile::NamedTempFile::new_in(dir.unwrap_or_else(|| Path::new(".")))
        .context("creating temp dashboard file")?;
    use std::io::Write as _;
    tmp.write_all(html.as_bytes()).context("writing temp dashboard file")?;
    tmp.persist(path)
        .with_context(|| format!("replacing {}", path.display()))?;
    tracing::info!(target: "dashboard", path = %path.display(), "dashboard generated");
    Ok(())
}

const HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>KI Job Tracker - Research Positions</title>
    <style>
        :root {
            --primary: #1a365d;
            --accent: #2c5282;
            --warning: #c05621;
            --light: #f7fafc;
            --border: #e2e8f0;
        }
        * { box-sizing: border-box; margin: 0; padding: 0; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: var(--light);
            color: #2d3748;
            line-height: 1.6;
            padding: 1rem;
        }
        .container { max-width: 900px; margin: 0 auto; }
        header {
            background: var(--primary);
            color: white;
            padding: 1.5rem;
            border-radius: 8px;
            margin-bottom: 1.5rem;
        }
        header h1 { font-size: 1.5rem; margin-bottom: 0.5rem; }
        .subtitle { opacity: 0.9; font-size: 0.9rem; }
        .stats { display: flex; gap: 1rem; margin-top: 1rem; flex-wrap: wrap; }
        .stat {
            background: rgba(255,255,255,0.15);
            padding: 0.5rem 1rem;
            border-radius: 4px;
            font-size: 0.85rem;
        }
        .stat strong { font-size: 1.2rem; }
        .section {
            background: white;
            border-radius: 8px;
            padding: 1rem;
            margin-bottom: 1rem;
            box-shadow: 0 1px 3px rgba(0,0,0,0.1);
        }
        .section h2 {
            color: var(--primary);
            font-size: 1.1rem;
            margin-bottom: 1rem;
            padding-bottom: 0.5rem;
            border-bottom: 2px solid var(--border);
        }
        .job-list { list-style: none; }
        .job { padding: 1rem; border-bottom: 1px solid var(--border); }
        .job:last-child { border-bottom: none; }
        .job-title {
            font-weight: 600;
            color: var(--accent);
            text-decoration: none;
            display: block;
            margin-bottom: 0.5rem;
        }
        .job-title:hover { text-decoration: underline; }
        .job-meta {
            display: flex;
            gap: 1rem;
            flex-wrap: wrap;
            font-size: 0.85rem;
            color: #718096;
        }
        .badge {
            display: inline-block;
            padding: 0.2rem 0.5rem;
            border-radius: 4px;
            font-size: 0.75rem;
            font-weight: 500;
        }
        .badge-high { background: #fed7d7; color: #c53030; }
        .badge-closing { background: #feebc8; color: var(--warning); }
        .badge-keyword { background: #e2e8f0; color: #4a5568; }
        .keywords { margin-top: 0.5rem; display: flex; gap: 0.25rem; flex-wrap: wrap; }
        .empty { color: #a0aec0; text-align: center; padding: 2rem; }
        footer { text-align: center; color: #a0aec0; font-size: 0.8rem; margin-top: 2rem; }
        footer a { color: var(--accent); }
        @media (max-width: 600px) {
            body { padding: 0.5rem; }
            header { padding: 1rem; }
            .job-meta { flex-direction: column; gap: 0.5rem; }
        }
    </style>
</head>
<body>
    <div class="container">
"#;
