use clap::{Arg, ArgAction, Command};
use dashboard_ingest::present::{category_shares, KeyStats, TextSink};
use dashboard_ingest::{
    charset_for_label, source_for, Dataset, FallbackTable, LoadOptions, LoadReport, Loader,
    Registry, Sink, SinkSet,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let matches = Command::new("dashload")
        .arg(Arg::new("base").long("base").help("Tables directory or HTTP base URL").required(true))
        .arg(Arg::new("view").long("view").help("Named view to load (e.g. website, report, norms)"))
        .arg(Arg::new("dataset").long("dataset").help("Dataset to load; repeatable").action(ArgAction::Append))
        .arg(Arg::new("registry").long("registry").help("Registry JSON; defaults to the built-in dashboard registry").value_parser(clap::value_parser!(PathBuf)))
        .arg(Arg::new("charset").long("charset").help("Charset of the tables").default_value("utf-8"))
        .arg(Arg::new("timeout-secs").long("timeout-secs").help("Give up on a source tier after N seconds").value_parser(clap::value_parser!(u64)))
        .get_matches();

    let base = matches
        .get_one::<String>("base")
        .ok_or_else(|| anyhow::anyhow!("--base is required"))?;
    let charset = match matches.get_one::<String>("charset") {
        Some(label) => charset_for_label(label)?,
        None => encoding_rs::UTF_8,
    };
    let registry = match matches.get_one::<PathBuf>("registry") {
        Some(path) => Registry::from_json_path(path)?,
        None => Registry::builtin(),
    };
    let options = LoadOptions {
        timeout: matches
            .get_one::<u64>("timeout-secs")
            .map(|s| Duration::from_secs(*s)),
    };

    let loader = Loader::new(
        source_for(base, charset)?,
        registry,
        Arc::new(FallbackTable::builtin()),
    )?
    .with_options(options);

    let captured = Arc::new(Captured::default());
    let mut sinks = SinkSet::new();
    sinks.register_all(Arc::new(TextSink::new(std::io::stdout())));
    for name in HEADLINE_DATASETS {
        sinks.register(name, captured.clone());
    }

    let start = Instant::now();
    let datasets: Option<Vec<String>> = matches
        .get_many::<String>("dataset")
        .map(|names| names.cloned().collect());
    let reports = match (matches.get_one::<String>("view"), datasets) {
        (Some(view), _) => loader.load_view(view, &sinks).await?,
        (None, Some(names)) => {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            loader.load_names(&names, &sinks).await?
        }
        (None, None) => loader.load_all(&sinks).await,
    };
    let elapsed = start.elapsed().as_secs_f64();

    print_headline(&captured);
    print_tiers(&reports);
    println!("elapsed={elapsed:.2}s datasets={}", reports.len());
    Ok(())
}

/// Keeps the datasets the headline block is computed from.
#[derive(Default)]
struct Captured(Mutex<HashMap<String, Dataset>>);

impl Sink for Captured {
    fn present(&self, name: &str, dataset: &Dataset) {
        if let Ok(mut seen) = self.0.lock() {
            seen.insert(name.to_string(), dataset.clone());
        }
    }
}

const HEADLINE_DATASETS: [&str; 4] = [
    "reliability",
    "descriptive",
    "demographics_gender",
    "demographics_education",
];

fn print_headline(captured: &Captured) {
    let Ok(seen) = captured.0.lock() else {
        return;
    };
    if let (Some(reliability), Some(descriptive)) = (seen.get("reliability"), seen.get("descriptive")) {
        println!("{}\n", KeyStats::compute(reliability, descriptive));
    }
    for name in &HEADLINE_DATASETS[2..] {
        let Some(dataset) = seen.get(*name) else {
            continue;
        };
        println!("{name}:");
        for share in category_shares(dataset) {
            println!("  {}: {} ({:.1}%)", share.label, share.count, share.percent);
        }
        println!();
    }
}

fn print_tiers(reports: &[LoadReport]) {
    for r in reports {
        let failed: Vec<String> = r
            .failures
            .iter()
            .map(|a| format!("{}:{}", a.tier, a.failure))
            .collect();
        println!(
            "{:<24} tier={:<9} rows={:<4} crc=0x{:08x} {}",
            r.name,
            r.tier,
            r.rows,
            r.fingerprint,
            failed.join("; ")
        );
    }
}
