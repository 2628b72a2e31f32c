use clap::{Parser, Subcommand};
use knit_grid::config::{self, ApiCredentials, SiteConfig};
use knit_grid::{fetch, generate, output};
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "knit-grid")]
#[command(about = "Static gallery of knitting patterns with lazy-loaded images")]
#[command(long_about = "\
Static gallery of knitting patterns with lazy-loaded images

Fetches a pattern search from the catalog API and renders one page: a
responsive grid where each photo loads only once it scrolls into view,
fading in over a blurred thumbnail.

Required environment:
  API_BASE_URL         Catalog API root, with trailing slash
  READ_ONLY_USERNAME   Basic-auth user
  READ_ONLY_PASSWORD   Basic-auth password

Optional <site>/config.toml tunes the search, the grid and the images.
Run 'knit-grid gen-config' to print a documented one.

Set RUST_LOG=info (or debug) for diagnostic logging.")]
#[command(version = version_string())]
struct Cli {
    /// Directory holding config.toml
    #[arg(long, default_value = ".", global = true)]
    site: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Directory for the fetched patterns.json
    #[arg(long, default_value = ".knit-grid-temp", global = true)]
    temp_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the pattern search into patterns.json
    Fetch,
    /// Render index.html from patterns.json
    Generate,
    /// Fetch then generate; writes an error page if the fetch fails
    Build,
    /// Validate config.toml and credentials without network access
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let patterns_path = cli.temp_dir.join("patterns.json");

    match cli.command {
        Command::Fetch => {
            let site_config = config::load_config(&cli.site)?;
            run_fetch(&site_config, &patterns_path)?;
        }
        Command::Generate => {
            let site_config = config::load_config(&cli.site)?;
            let summary = generate::generate(&patterns_path, &cli.output, &site_config)?;
            output::print_generate_output(&summary);
        }
        Command::Build => {
            let site_config = config::load_config(&cli.site)?;

            println!("==> Stage 1: Fetching patterns");
            if let Err(err) = run_fetch(&site_config, &patterns_path) {
                let page = generate::write_error_page(&cli.output, &site_config, &err.to_string())?;
                println!("==> Fetch failed, error page → {}", page.display());
                return Err(err.into());
            }

            println!("==> Stage 2: Generating HTML → {}", cli.output.display());
            let summary = generate::generate(&patterns_path, &cli.output, &site_config)?;
            output::print_generate_output(&summary);

            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.site.join("config.toml").display());
            let site_config = config::load_config(&cli.site)?;
            let credentials = ApiCredentials::from_env()?;
            let url = fetch::search_url(&credentials.base_url, &site_config.search)?;
            println!("Search: {}", url);
            println!("==> Configuration is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Credentials are read first so a missing variable fails before any request.
fn run_fetch(site_config: &SiteConfig, patterns_path: &Path) -> Result<(), fetch::FetchError> {
    let credentials = ApiCredentials::from_env()?;
    let response = fetch::fetch_patterns(&credentials, &site_config.search)?;
    fetch::write_patterns(patterns_path, &response)?;
    output::print_fetch_output(&response);
    Ok(())
}
