//! movie-analysis command-line entry point.

mod commands;
mod config;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use commands::MovieQuery;

#[derive(Parser)]
#[command(
    name = "movie-analysis",
    about = "Movie data from robots.txt sitemaps, the Bechdel-test API and Tomatometer rankings",
    version
)]
struct Cli {
    /// Path to a JSON config file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Emit JSON instead of text tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the sitemap URLs a site advertises in robots.txt.
    Sitemaps {
        /// Site base URL (defaults to the configured site).
        #[arg(long)]
        site: Option<String>,

        /// Also fetch each sitemap and list its entries.
        #[arg(long)]
        entries: bool,
    },

    /// Query the Bechdel-test movie API.
    Movies {
        #[command(subcommand)]
        query: MoviesQuery,

        /// Keep post-1967 rows and add the pass_test column.
        #[arg(long, global = true)]
        process: bool,
    },

    /// Scrape the Tomatometer ranking page.
    Ratings {
        /// Page URL (defaults to the configured ranking page).
        #[arg(long)]
        url: Option<String>,

        /// Print the scraped text fields without normalizing them.
        #[arg(long)]
        raw: bool,
    },

    /// Run every source and print the chart series.
    Report,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   movie-analysis completions bash > ~/.local/share/bash-completion/completions/movie-analysis
    ///   movie-analysis completions zsh > ~/.zfunc/_movie-analysis
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum MoviesQuery {
    /// Every movie the API knows about.
    All,

    /// Movies whose title matches.
    Title {
        /// Title to search for.
        title: String,
    },

    /// A single movie by IMDb identifier (digits only, no "tt" prefix).
    Imdb {
        /// IMDb identifier.
        id: String,
    },
}

impl From<MoviesQuery> for MovieQuery {
    fn from(query: MoviesQuery) -> Self {
        match query {
            MoviesQuery::All => MovieQuery::All,
            MoviesQuery::Title { title } => MovieQuery::Title(title),
            MoviesQuery::Imdb { id } => MovieQuery::ImdbId(id),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let json = cli.json;
    if let Err(e) = run(cli).await {
        if json {
            let error = serde_json::json!({ "error": format!("{e:#}") });
            eprintln!("{error}");
        } else {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "movie-analysis", &mut std::io::stdout());
        return Ok(());
    }

    let config = config::load_config(cli.config.as_deref())?;
    tracing::debug!(
        site = %config.sources.site_url,
        api = %config.sources.api_base_url,
        ratings = %config.sources.ratings_url,
        "effective sources"
    );

    match cli.command {
        Commands::Sitemaps { site, entries } => {
            commands::sitemaps(&config, site.as_deref(), entries, cli.json).await
        }
        Commands::Movies { query, process } => {
            commands::movies(&config, query.into(), process, cli.json).await
        }
        Commands::Ratings { url, raw } => {
            commands::ratings(&config, url.as_deref(), raw, cli.json).await
        }
        Commands::Report => commands::report(&config, cli.json).await,
        Commands::Completions { .. } => Ok(()),
    }
}
