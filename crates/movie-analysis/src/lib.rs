//! movie-analysis: acquisition and normalization of movie data from
//! robots.txt sitemaps, the Bechdel-test API, and a Tomatometer ranking page.

pub mod bechdel;
pub mod config;
pub mod error;
pub mod http_client;
pub mod ratings;
pub mod robots;
pub mod sitemap;
pub mod stats;
pub mod table;

pub use bechdel::{
    add_pass_test_column, process_movies, BechdelRow, BechdelScore, MovieApiClient, MovieRecord,
    ProcessedMovieRecord,
};
pub use config::{AnalysisConfig, HttpConfig, PageSelectors, SourcesConfig};
pub use error::{HarvestError, HarvestResult};
pub use http_client::{HttpClient, HttpResponse};
pub use ratings::{
    extract_movies, extract_movies_report, prepare_data, CompiledSelectors, ExtractionReport,
    RankedMovieRecord, RatingsPageScraper, RawRankedMovie,
};
pub use robots::{parse_sitemap_directives, RobotsSitemapReader, SitemapUrl};
pub use sitemap::{parse_sitemap, EntryKind, SitemapEntry};
pub use stats::{Bar, BarChart};
pub use table::Table;
