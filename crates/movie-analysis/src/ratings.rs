//! Scrape a ranked Tomatometer listing page.
//!
//! Each ranked movie sits in its own container node; title and detail URL
//! come from the first anchor, year and score from marker spans. Selectors
//! are taken from `PageSelectors` and compiled once per scraper.

use std::fmt;

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::config::{HttpConfig, PageSelectors};
use crate::error::{HarvestError, HarvestResult};
use crate::http_client::HttpClient;
use crate::table::Table;

/// A listing item exactly as extracted, before numeric cleanup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawRankedMovie {
    pub title: String,
    /// Year text without parentheses, e.g. `"1994"`.
    pub year: String,
    /// Percentage text, e.g. `"85%"`.
    pub score: String,
    pub url: String,
}

/// A cleaned listing item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMovieRecord {
    pub title: String,
    pub year: i32,
    /// Tomatometer fraction in `[0, 1]`.
    pub score: f64,
    pub url: String,
}

/// Fields pulled from each listing item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MovieField {
    Title,
    Year,
    Score,
    Url,
}

impl fmt::Display for MovieField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Title => "title",
            Self::Year => "year",
            Self::Score => "score",
            Self::Url => "url",
        };
        f.write_str(name)
    }
}

/// A listing item that could not be extracted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemFailure {
    /// Position of the container in document order.
    pub index: usize,
    pub field: MovieField,
}

/// Outcome of a tolerant extraction.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    pub rows: Table<RawRankedMovie>,
    pub failures: Vec<ItemFailure>,
}

/// `PageSelectors` parsed into CSS selectors.
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    container: Selector,
    anchor: Selector,
    year: Selector,
    score: Selector,
}

impl CompiledSelectors {
    pub fn compile(selectors: &PageSelectors) -> HarvestResult<Self> {
        Ok(Self {
            container: parse_selector(&selectors.container)?,
            anchor: parse_selector(&selectors.anchor)?,
            year: parse_selector(&selectors.year)?,
            score: parse_selector(&selectors.score)?,
        })
    }
}

fn parse_selector(css: &str) -> HarvestResult<Selector> {
    Selector::parse(css).map_err(|e| HarvestError::Parse(format!("invalid selector {css:?}: {e}")))
}

/// Scraper for one listing page.
pub struct RatingsPageScraper {
    url: String,
    client: HttpClient,
    selectors: CompiledSelectors,
}

impl RatingsPageScraper {
    pub fn new(url: &str, http: &HttpConfig, selectors: &PageSelectors) -> HarvestResult<Self> {
        url::Url::parse(url).map_err(|source| HarvestError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        Ok(Self {
            url: url.to_string(),
            client: HttpClient::new(http)?,
            selectors: CompiledSelectors::compile(selectors)?,
        })
    }

    /// Fetch and parse the listing page.
    pub async fn get_page(&self) -> HarvestResult<Html> {
        let response = self.client.get(&self.url, &[]).await?;
        tracing::debug!("{} returned {}", self.url, response.status);
        let response = response.error_for_status()?;
        Ok(Html::parse_document(&response.body))
    }

    /// Fetch the page and extract every listing item, aborting on the first
    /// malformed one.
    pub async fn scrape_movies(&self) -> HarvestResult<Table<RawRankedMovie>> {
        let document = self.get_page().await?;
        let movies = extract_movies(&document, &self.selectors)?;
        tracing::info!("scraped {} ranked movie(s) from {}", movies.len(), self.url);
        Ok(movies)
    }

    /// Like `scrape_movies` but keeps going past malformed items.
    pub async fn scrape_movies_report(&self) -> HarvestResult<ExtractionReport> {
        let document = self.get_page().await?;
        Ok(extract_movies_report(&document, &self.selectors))
    }
}

/// Extract all listing items in document order. Fails on the first item
/// missing any field.
pub fn extract_movies(
    document: &Html,
    selectors: &CompiledSelectors,
) -> HarvestResult<Table<RawRankedMovie>> {
    document
        .select(&selectors.container)
        .enumerate()
        .map(|(index, item)| {
            extract_item(item, selectors).map_err(|field| {
                HarvestError::Parse(format!("listing item {index} has no {field}"))
            })
        })
        .collect::<HarvestResult<Vec<_>>>()
        .map(Table::new)
}

/// Extract all well-formed listing items and report the rest.
pub fn extract_movies_report(document: &Html, selectors: &CompiledSelectors) -> ExtractionReport {
    let mut rows = Vec::new();
    let mut failures = Vec::new();

    for (index, item) in document.select(&selectors.container).enumerate() {
        match extract_item(item, selectors) {
            Ok(row) => rows.push(row),
            Err(field) => {
                tracing::warn!("skipping listing item {index}: no {field}");
                failures.push(ItemFailure { index, field });
            }
        }
    }

    ExtractionReport {
        rows: Table::new(rows),
        failures,
    }
}

fn extract_item(
    item: ElementRef,
    selectors: &CompiledSelectors,
) -> Result<RawRankedMovie, MovieField> {
    let anchor = item
        .select(&selectors.anchor)
        .next()
        .ok_or(MovieField::Title)?;
    let title = text_of(anchor);

    let year = item
        .select(&selectors.year)
        .next()
        .map(|n| {
            text_of(n)
                .trim_matches(|c: char| c == '(' || c == ')' || c.is_whitespace())
                .to_string()
        })
        .ok_or(MovieField::Year)?;

    let score = item
        .select(&selectors.score)
        .next()
        .map(text_of)
        .ok_or(MovieField::Score)?;

    let url = anchor
        .value()
        .attr("href")
        .map(|h| h.trim().to_string())
        .ok_or(MovieField::Url)?;

    Ok(RawRankedMovie {
        title,
        year,
        score,
        url,
    })
}

fn text_of(node: ElementRef) -> String {
    node.text().collect::<String>().trim().to_string()
}

/// Turn score text into a fraction and year text into an integer.
pub fn prepare_data(table: &Table<RawRankedMovie>) -> HarvestResult<Table<RankedMovieRecord>> {
    table
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            Ok(RankedMovieRecord {
                title: raw.title.clone(),
                year: parse_year(&raw.year).ok_or_else(|| {
                    HarvestError::DataShape(format!(
                        "row {i} ({}): year {:?} is not a 4-digit year",
                        raw.title, raw.year
                    ))
                })?,
                score: parse_score(&raw.score).ok_or_else(|| {
                    HarvestError::DataShape(format!(
                        "row {i} ({}): score {:?} is not a percentage in 0-100",
                        raw.title, raw.score
                    ))
                })?,
                url: raw.url.clone(),
            })
        })
        .collect::<HarvestResult<Vec<_>>>()
        .map(Table::new)
}

fn parse_year(s: &str) -> Option<i32> {
    s.trim()
        .parse::<i32>()
        .ok()
        .filter(|y| (1000..=9999).contains(y))
}

fn parse_score(s: &str) -> Option<f64> {
    s.trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()
        .map(|pct| pct / 100.0)
        .filter(|f| (0.0..=1.0).contains(f))
}
