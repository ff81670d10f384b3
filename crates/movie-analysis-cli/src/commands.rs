//! Subcommand implementations.

use anyhow::{Context, Result};
use movie_analysis::bechdel::{add_pass_test_column, process_movies, MovieApiClient};
use movie_analysis::ratings::{prepare_data, RatingsPageScraper};
use movie_analysis::robots::RobotsSitemapReader;
use movie_analysis::{stats, AnalysisConfig};
use serde_json::json;

use crate::output::{print_chart, print_json, print_table};

/// Rows shown per table in text mode for the report.
const REPORT_PREVIEW_ROWS: usize = 5;

/// Which API query to run.
pub enum MovieQuery {
    All,
    Title(String),
    ImdbId(String),
}

/// `movie-analysis sitemaps`
pub async fn sitemaps(
    config: &AnalysisConfig,
    site: Option<&str>,
    entries: bool,
    json: bool,
) -> Result<()> {
    let site = site.unwrap_or(&config.sources.site_url);
    let reader = RobotsSitemapReader::new(site, &config.http)?;
    let sitemaps = reader.fetch_sitemaps().await;

    if !entries {
        if json {
            return print_json(&sitemaps);
        }
        if sitemaps.is_empty() {
            println!("No sitemap data found for {site}");
        }
        for sitemap in &sitemaps {
            println!("{sitemap}");
        }
        return Ok(());
    }

    let mut listing = Vec::with_capacity(sitemaps.len());
    for sitemap in &sitemaps {
        let found = reader
            .fetch_sitemap_entries(sitemap)
            .await
            .with_context(|| format!("failed to read sitemap {sitemap}"))?;
        listing.push((sitemap, found));
    }

    if json {
        let value: Vec<_> = listing
            .iter()
            .map(|(sitemap, found)| json!({ "sitemap": sitemap, "entries": found }))
            .collect();
        return print_json(&value);
    }
    for (sitemap, found) in &listing {
        println!("{sitemap} ({} entries)", found.len());
        for entry in found {
            println!("  {}", entry.url);
        }
    }
    Ok(())
}

/// `movie-analysis movies`
pub async fn movies(
    config: &AnalysisConfig,
    query: MovieQuery,
    process: bool,
    json: bool,
) -> Result<()> {
    let client = MovieApiClient::new(&config.sources.api_base_url, &config.http)?;
    let table = match query {
        MovieQuery::All => client.fetch_all_movies().await?,
        MovieQuery::Title(title) => client.fetch_movies_by_title(&title).await?,
        MovieQuery::ImdbId(id) => client.fetch_movie_by_imdb_id(&id).await?,
    };

    if process {
        print_table(&add_pass_test_column(&process_movies(&table)), json, None)
    } else {
        print_table(&table, json, None)
    }
}

/// `movie-analysis ratings`
pub async fn ratings(
    config: &AnalysisConfig,
    url: Option<&str>,
    raw: bool,
    json: bool,
) -> Result<()> {
    let url = url.unwrap_or(&config.sources.ratings_url);
    let scraper = RatingsPageScraper::new(url, &config.http, &config.selectors)?;
    let scraped = scraper.scrape_movies().await?;

    if raw {
        print_table(&scraped, json, None)
    } else {
        print_table(&prepare_data(&scraped)?, json, None)
    }
}

/// `movie-analysis report`: every source in turn, then the chart series.
pub async fn report(config: &AnalysisConfig, json: bool) -> Result<()> {
    let reader = RobotsSitemapReader::new(&config.sources.site_url, &config.http)?;
    let sitemaps = reader.fetch_sitemaps().await;

    let client = MovieApiClient::new(&config.sources.api_base_url, &config.http)?;
    let all_movies = client.fetch_all_movies().await?;
    let processed = add_pass_test_column(&process_movies(&all_movies));

    let scraper = RatingsPageScraper::new(
        &config.sources.ratings_url,
        &config.http,
        &config.selectors,
    )?;
    let ranked = prepare_data(&scraper.scrape_movies().await?)?;

    let charts = vec![
        stats::movies_by_year(&ranked),
        stats::average_score_by_year(&ranked),
        stats::bechdel_score_counts(&processed),
        stats::pass_test_counts(&processed)?,
    ];

    if json {
        return print_json(&json!({
            "sitemaps": sitemaps,
            "movies": all_movies.len(),
            "processed_movies": processed.len(),
            "ranked_movies": ranked,
            "charts": charts,
        }));
    }

    section("Sitemaps");
    if sitemaps.is_empty() {
        println!("No sitemap data found.");
    }
    for sitemap in &sitemaps {
        println!("{sitemap}");
    }

    section("Bechdel-test movies");
    println!("{} movies, {} released after 1967", all_movies.len(), processed.len());
    print_table(&processed, false, Some(REPORT_PREVIEW_ROWS))?;

    section("Tomatometer ranking");
    print_table(&ranked, false, Some(REPORT_PREVIEW_ROWS))?;

    for chart in &charts {
        section(&chart.title);
        print_chart(chart, false)?;
    }
    Ok(())
}

fn section(title: &str) {
    println!("------------------------------------------------");
    println!("{title}");
    println!("------------------------------------------------");
}

