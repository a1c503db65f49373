use clap::{Arg, Command};
use dashboard_ingest::{FallbackTable, Registry};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Write the compiled-in fallback tables to `--out`, laid out at each dataset's
/// primary locator, so a fresh tables directory can be served right away.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let matches = Command::new("seed")
        .arg(
            Arg::new("out")
                .long("out")
                .value_parser(clap::value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new("registry")
                .long("registry")
                .help("Registry JSON; defaults to the built-in dashboard registry")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .get_matches();

    let out = matches
        .get_one::<PathBuf>("out")
        .ok_or_else(|| anyhow::anyhow!("--out is required"))?;
    let registry = match matches.get_one::<PathBuf>("registry") {
        Some(path) => Registry::from_json_path(path)?,
        None => Registry::builtin(),
    };
    let fallback = FallbackTable::builtin();
    registry.validate(&fallback)?;

    for d in &registry.datasets {
        let Some(dataset) = fallback.get(&d.name) else {
            continue;
        };
        let path = out.join(&d.primary);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = tokio::fs::File::create(&path).await?;
        dataset.write_csv(file).await?;
        info!(dataset = %d.name, path = %path.display(), rows = dataset.len(), "seeded");
    }

    println!(
        "seeded {} tables (fallback version {}) into {}",
        registry.datasets.len(),
        fallback.version(),
        out.display()
    );
    Ok(())
}
