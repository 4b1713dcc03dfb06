use std::path::PathBuf;

use clap::Parser;
use pagepress_core::Profile;
use pagepress_engine::TransportKind;

#[derive(Parser, Debug)]
#[command(name = "pagepress")]
#[command(about = "Estimate, submit and retrieve per-page optimized PDF documents")]
pub struct Args {
    /// PDF document to optimize.
    pub input: PathBuf,

    /// Path to a RON config. If omitted, uses ./pagepress.ron when present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Profile applied to every page before per-page overrides.
    #[arg(long, value_parser = parse_profile)]
    pub profile: Option<Profile>,

    /// Per-page override as PAGE=PROFILE, pages numbered from 1. Repeatable.
    #[arg(long = "page", value_parser = parse_page_override)]
    pub pages: Vec<PageOverride>,

    /// Print the size estimate and stop without submitting.
    #[arg(long)]
    pub estimate_only: bool,

    /// Override the configured progress transport.
    #[arg(long, value_parser = parse_transport)]
    pub transport: Option<TransportKind>,

    /// Override the configured service base url.
    #[arg(long)]
    pub server: Option<String>,

    /// Directory the optimized document is saved into.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Log file path.
    #[arg(long, default_value = press_logging::DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Also log to the terminal.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOverride {
    /// Zero-based page index.
    pub index: usize,
    pub profile: Profile,
}

fn parse_profile(raw: &str) -> Result<Profile, String> {
    raw.parse::<Profile>().map_err(|err| err.to_string())
}

fn parse_page_override(raw: &str) -> Result<PageOverride, String> {
    let (page, profile) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected PAGE=PROFILE, got {raw:?}"))?;
    let page: usize = page
        .trim()
        .parse()
        .map_err(|_| format!("invalid page number {page:?}"))?;
    if page == 0 {
        return Err("page numbers start at 1".to_string());
    }
    Ok(PageOverride {
        index: page - 1,
        profile: parse_profile(profile.trim())?,
    })
}

fn parse_transport(raw: &str) -> Result<TransportKind, String> {
    match raw.to_ascii_lowercase().as_str() {
        "poll" => Ok(TransportKind::Poll),
        "push" => Ok(TransportKind::Push),
        other => Err(format!("unknown transport {other:?}, expected poll or push")),
    }
}
