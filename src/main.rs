use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;

use robots_parser::config::FetchSettings;
use robots_parser::fetch::Fetcher;
use robots_parser::{parser, sitemap, ParseResult};

#[derive(Parser)]
#[command(name = "robots", about = "Parse robots.txt files into per-agent rules")]
struct Cli {
    #[command(flatten)]
    fetch: FetchArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides for the ROBOTS_* environment settings
#[derive(Args)]
struct FetchArgs {
    /// Max concurrent requests
    #[arg(long, global = true)]
    concurrency: Option<usize>,
    /// Retries on 429/5xx and connection errors
    #[arg(long, global = true)]
    retries: Option<u32>,
    /// Per-request timeout
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    /// User-Agent header sent with requests
    #[arg(long, global = true)]
    user_agent: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse local robots.txt files ("-" reads stdin)
    Parse {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Fetch and parse robots.txt for one or more sites
    Fetch {
        #[arg(required = true)]
        sites: Vec<String>,
        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// List page URLs from the sitemaps a site's robots.txt declares
    Sitemaps {
        site: String,
        /// Max URLs to print
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
}

impl FetchArgs {
    fn settings(self) -> anyhow::Result<FetchSettings> {
        let mut settings = FetchSettings::load().context("Failed to load ROBOTS_* settings")?;
        if let Some(n) = self.concurrency {
            settings.concurrency = n;
        }
        if let Some(n) = self.retries {
            settings.max_retries = n;
        }
        if let Some(secs) = self.timeout_secs {
            settings.timeout_secs = secs;
        }
        if let Some(ua) = self.user_agent {
            settings.user_agent = ua;
        }
        Ok(settings.clamped())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse { files, json } => {
            let results: Vec<(String, anyhow::Result<ParseResult>)> = files
                .par_iter()
                .map(|path| (path.display().to_string(), load_and_parse(path)))
                .collect();
            report(results, json)
        }
        Commands::Fetch { sites, json } => {
            let fetcher = Fetcher::new(cli.fetch.settings()?)?;
            let outcomes = fetcher.fetch_many(sites).await;
            let results = outcomes
                .into_iter()
                .map(|o| (o.site, o.result.map_err(anyhow::Error::from)))
                .collect();
            report(results, json)
        }
        Commands::Sitemaps { site, limit } => {
            let fetcher = Fetcher::new(cli.fetch.settings()?)?;
            let robots = fetcher
                .fetch_robots(&site)
                .await
                .with_context(|| format!("Failed to fetch robots.txt for {}", site))?;
            if robots.sitemaps.is_empty() {
                println!("No sitemaps declared in robots.txt.");
                return Ok(());
            }

            let collected = sitemap::collect_pages(&fetcher, &robots.sitemaps).await;
            let shown = limit.unwrap_or(collected.pages.len());
            for url in collected.pages.iter().take(shown) {
                println!("{}", url);
            }
            println!(
                "\n{} URLs from {} sitemaps ({} failed)",
                collected.pages.len(),
                robots.sitemaps.len(),
                collected.failures.len()
            );
            for (url, e) in &collected.failures {
                eprintln!("  {}: {}", url, e);
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

fn load_and_parse(path: &Path) -> anyhow::Result<ParseResult> {
    let bytes = if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?
    };
    Ok(parser::parse_bytes(&bytes)?)
}

/// Print each document (summary or JSON) and fail if any of them failed.
fn report(results: Vec<(String, anyhow::Result<ParseResult>)>, json: bool) -> anyhow::Result<()> {
    let total = results.len();
    let mut parsed = BTreeMap::new();
    let mut failed = 0usize;

    for (name, result) in results {
        match result {
            Ok(r) => {
                if !json {
                    print_summary(&name, &r);
                }
                parsed.insert(name, r);
            }
            Err(e) => {
                eprintln!("{}: {:#}", name, e);
                failed += 1;
            }
        }
    }

    if json {
        let out = if total == 1 {
            match parsed.values().next() {
                Some(r) => serde_json::to_string_pretty(r)?,
                None => String::new(),
            }
        } else {
            serde_json::to_string_pretty(&parsed)?
        };
        if !out.is_empty() {
            println!("{}", out);
        }
    }

    if failed > 0 {
        bail!("{} of {} documents failed", failed, total);
    }
    Ok(())
}

fn print_summary(name: &str, r: &ParseResult) {
    println!("== {}", name);
    if r.rulesets.is_empty() {
        println!("  (no user-agent groups)");
    } else {
        println!("  {:<24} | {:>5} | {:>8} | {:<6}", "Agent", "Allow", "Disallow", "Delay");
        println!("  {}", "-".repeat(54));
        for (agent, rules) in &r.rulesets {
            println!(
                "  {:<24} | {:>5} | {:>8} | {:<6}",
                truncate(agent, 24),
                rules.allow.len(),
                rules.disallow.len(),
                rules.delay.as_deref().unwrap_or("-")
            );
        }
    }

    for s in &r.sitemaps {
        println!("  sitemap: {}", s);
    }
    if !r.unknown.is_empty() {
        println!("  {} unrecognized directives", r.unknown.len());
    }
    println!();
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
