mod batch;
mod db;
mod error;
mod extract;
mod settings;
mod stopwords;
mod transform;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use settings::Settings;

#[derive(Parser)]
#[command(name = "newspaper_etl", about = "Newspaper article extract / transform / load")]
struct Cli {
    /// Settings file (YAML)
    #[arg(short, long, global = true, default_value = settings::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape a configured news site into <site>_<date>_articles.csv
    Extract {
        /// Site uid from `news_sites`
        site: String,
        /// Max articles to fetch (default: all homepage links)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Directory for the raw batch
        #[arg(long, default_value = "data")]
        out_dir: PathBuf,
    },
    /// Clean a raw batch into clean_<file>
    Transform {
        file: PathBuf,
    },
    /// Load a clean batch into the database
    Load {
        file: PathBuf,
    },
    /// Extract + transform + load for one site
    Run {
        site: String,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        #[arg(long, default_value = "data")]
        out_dir: PathBuf,
    },
    /// Show loaded article counts
    Stats {
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)?;
    info!(config = ?cli.config, sites = settings.news_sites.len(), "Settings loaded");

    let result = match cli.command {
        Commands::Extract { site, limit, out_dir } => {
            extract_site(&settings, &site, limit, &out_dir).await.map(|_| ())
        }
        Commands::Transform { file } => transform_file(&settings, &file).map(|_| ()),
        Commands::Load { file } => load_file(&settings, &file),
        Commands::Run { site, limit, out_dir } => {
            let raw = extract_site(&settings, &site, limit, &out_dir).await?;
            let clean = transform_file(&settings, &raw)?;
            load_file(&settings, &clean)
        }
        Commands::Stats { json } => {
            let conn = db::connect(Path::new(&settings.database.path))?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&s)?);
            } else {
                println!("Articles: {}", s.total);
                for src in &s.sources {
                    println!(
                        "  {:<16} {:>6} articles, {:.1} body tokens avg",
                        src.source_id, src.articles, src.avg_tokens_body
                    );
                }
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn extract_site(
    settings: &Settings,
    site_uid: &str,
    limit: Option<usize>,
    out_dir: &Path,
) -> Result<PathBuf> {
    let site = settings.site(site_uid)?;
    let extracted = extract::extract_site(site_uid, site, &settings.extract, limit).await?;

    std::fs::create_dir_all(out_dir)?;
    let name = batch::articles_file_name(site_uid, chrono::Local::now().date_naive());
    let path = out_dir.join(name);
    batch::write_raw_file(&path, &extracted.articles)?;

    let s = &extracted.stats;
    println!(
        "Extracted {} of {} articles ({} without body, {} errors) -> {}",
        s.ok,
        s.links,
        s.skipped,
        s.errors,
        path.display()
    );
    Ok(path)
}

fn transform_file(settings: &Settings, path: &Path) -> Result<PathBuf> {
    info!("Reading file {}", path.display());
    let raw = batch::read_raw_file(path)?;
    let source_id = batch::source_id_from_path(path)?;
    info!("Source id detected: {}", source_id);

    let cfg = settings.transform_config()?;
    let total = raw.len();
    let out = transform::run(raw, &source_id, &cfg)?;
    out.report.print();

    let clean = batch::clean_path(path);
    info!("Saving data at location: {}", clean.display());
    batch::write_clean_file(&clean, &out.articles)?;
    println!(
        "Cleaned {} -> {} rows -> {}",
        total,
        out.articles.len(),
        clean.display()
    );
    Ok(clean)
}

fn load_file(settings: &Settings, path: &Path) -> Result<()> {
    let articles = batch::read_clean_file(path)?;
    let conn = db::connect(Path::new(&settings.database.path))?;
    db::init_schema(&conn)?;
    debug!("Loading {} articles into {}", articles.len(), settings.database.path);
    let n = db::save_articles(&conn, &articles)?;
    println!("Loaded {} articles into {}", n, settings.database.path);
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
