pub mod cli;
pub mod render;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, bail};
use moviefetch_core::types::KNOWN_FIELDS;
use moviefetch_metadata::{API_KEY_PARAM, DownloadSelector, MovieRecord, RequestConfig};
use tracing::{info, warn};

use crate::cli::{Cli, FieldSelection};

pub const ENV_URL: &str = "MOVIEFETCH_URL";
pub const ENV_TIMEOUT: &str = "MOVIEFETCH_TIMEOUT";
pub const ENV_API_KEY: &str = "MOVIEFETCH_API_KEY";

/// Build the request config: defaults, then environment, then flags.
pub fn request_config(
    cli: &Cli,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<RequestConfig> {
    let mut config = RequestConfig::default();

    if let Some(url) = env(ENV_URL).filter(|v| !v.trim().is_empty()) {
        config = config.with_url(url.trim());
    }
    if let Some(secs) = env(ENV_TIMEOUT).filter(|v| !v.trim().is_empty()) {
        let secs: u64 = secs
            .trim()
            .parse()
            .with_context(|| format!("{ENV_TIMEOUT} must be a whole number of seconds"))?;
        config = config.with_timeout(Duration::from_secs(secs));
    }
    if let Some(key) = env(ENV_API_KEY).filter(|v| !v.trim().is_empty()) {
        config = config.with_param(API_KEY_PARAM, key.trim());
    }

    if let Some(url) = &cli.url {
        config = config.with_url(url.as_str());
    }
    if let Some(secs) = cli.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    if let Some(key) = &cli.api_key {
        config = config.with_param(API_KEY_PARAM, key.as_str());
    }

    Ok(config)
}

/// Run every query, writing results to `out` and failures to stderr.
pub fn run(cli: &Cli, out: &mut dyn Write) -> anyhow::Result<ExitCode> {
    let selection = FieldSelection::parse(&cli.fields);

    if selection == FieldSelection::ListKnown {
        writeln!(out, "Available fields:")?;
        for field in KNOWN_FIELDS {
            writeln!(out, "{field}")?;
        }
        return Ok(ExitCode::SUCCESS);
    }

    if cli.queries.is_empty() {
        bail!("no movie title given");
    }

    let config = request_config(cli, |name| std::env::var(name).ok())?;
    let selector = match &cli.download {
        Some(spec) => DownloadSelector::parse(spec)?,
        None => DownloadSelector::None,
    };
    info!(url = %config.url, queries = cli.queries.len(), "starting lookups");

    let mut failures = 0usize;
    for query in &cli.queries {
        if let Err(e) = lookup_one(cli, &config, &selector, &selection, query, out) {
            failures += 1;
            eprintln!("{e:#}");
            if !cli.ignore_error {
                return Ok(ExitCode::FAILURE);
            }
            warn!(query = %query, "lookup failed, continuing");
        }
    }

    if failures > 0 {
        info!(failures, "finished with ignored failures");
    }
    Ok(ExitCode::SUCCESS)
}

fn lookup_one(
    cli: &Cli,
    config: &RequestConfig,
    selector: &DownloadSelector,
    selection: &FieldSelection,
    query: &str,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    if !cli.quiet && !cli.json {
        let fields = match selection {
            FieldSelection::Named(names) => Some(names.as_slice()),
            _ => None,
        };
        write!(out, "{}", render::header(query, fields))?;
    }

    let mut movie = MovieRecord::with_options(query, Some(config.clone()), selector.clone())?;
    let info = movie
        .fetch()
        .with_context(|| format!("query '{query}'"))?;

    if cli.json {
        writeln!(out, "{}", serde_json::to_string_pretty(info)?)?;
    } else {
        let entries = match selection {
            FieldSelection::Named(names) => render::selected_entries(info, names)
                .with_context(|| format!("query '{query}'"))?,
            _ => render::all_entries(info),
        };
        write!(out, "{}", render::format_entries(&entries))?;
    }

    save_downloads(&movie, query, &cli.output_dir)
}

fn save_downloads(movie: &MovieRecord, query: &str, dir: &Path) -> anyhow::Result<()> {
    let cached = movie.cached();
    let stem = cached
        .and_then(|info| info.get("imdbid"))
        .and_then(|v| v.as_str())
        .map(slug)
        .unwrap_or_else(|| slug(query));

    let mut created = false;
    for (field, content) in movie.downloads() {
        if !created {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            created = true;
        }
        let ext = cached
            .and_then(|info| info.get(field))
            .and_then(|v| v.as_str())
            .and_then(url_extension)
            .unwrap_or_default();
        let path: PathBuf = dir.join(download_file_name(&stem, field, &ext));
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(field = %field, path = %path.display(), bytes = content.len(), "saved download");
    }
    Ok(())
}

/// `<stem>-<field><ext>`, with the remote-supplied field name reduced to a
/// single safe path component.
fn download_file_name(stem: &str, field: &str, ext: &str) -> String {
    format!("{stem}-{}{ext}", slug(field))
}

fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "movie".to_string()
    } else {
        trimmed.to_string()
    }
}

/// `.jpg` for `http://host/path/poster.jpg?x=1`, if the last segment has a
/// short alphanumeric extension.
fn url_extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let last = path.rsplit('/').next()?;
    let (_, ext) = last.rsplit_once('.')?;
    if ext.is_empty() || ext.len() > 5 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(format!(".{}", ext.to_ascii_lowercase()))
}
