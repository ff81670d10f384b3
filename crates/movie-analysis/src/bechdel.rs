//! Client and normalization for the Bechdel-test movie API.
//!
//! Records are decoded against an explicit schema. The API is inconsistent
//! about encodings (`"1999"` vs `1999`, `"3"` vs `3`), so `year`, `rating`
//! and `imdbid` accept either; everything else passes through untouched.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::config::HttpConfig;
use crate::error::{HarvestError, HarvestResult};
use crate::http_client::HttpClient;
use crate::table::Table;

/// Movies released in or before this year are dropped by `process_movies`.
pub const MIN_YEAR_EXCLUSIVE: i32 = 1967;

/// The 0–3 Bechdel rating, ordered from worst to passing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BechdelScore {
    /// Fewer than two named women.
    FewerThanTwoWomen = 0,
    /// The women never talk to each other.
    NoConversation = 1,
    /// They only talk about a man.
    TalkAboutMen = 2,
    /// Passes the test.
    Passes = 3,
}

impl BechdelScore {
    pub const ALL: [BechdelScore; 4] = [
        Self::FewerThanTwoWomen,
        Self::NoConversation,
        Self::TalkAboutMen,
        Self::Passes,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn passes(self) -> bool {
        self >= Self::Passes
    }
}

impl TryFrom<i64> for BechdelScore {
    type Error = HarvestError;

    fn try_from(v: i64) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::FewerThanTwoWomen),
            1 => Ok(Self::NoConversation),
            2 => Ok(Self::TalkAboutMen),
            3 => Ok(Self::Passes),
            other => Err(HarvestError::DataShape(format!(
                "Bechdel score must be 0-3, got {other}"
            ))),
        }
    }
}

impl fmt::Display for BechdelScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl Serialize for BechdelScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.value())
    }
}

impl<'de> Deserialize<'de> for BechdelScore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = deserializer.deserialize_any(IntegerVisitor("a Bechdel score"))?;
        BechdelScore::try_from(raw).map_err(de::Error::custom)
    }
}

/// Accepts an integer or a string holding one.
struct IntegerVisitor(&'static str);

impl<'de> Visitor<'de> for IntegerVisitor {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} as an integer or numeric string", self.0)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
        i64::try_from(v).map_err(|_| E::custom(format!("{} out of range: {v}", self.0)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
        v.trim()
            .parse()
            .map_err(|_| E::custom(format!("{} is not numeric: {v:?}", self.0)))
    }
}

fn year_from_json<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    let raw = deserializer.deserialize_any(IntegerVisitor("year"))?;
    i32::try_from(raw).map_err(|_| de::Error::custom(format!("year out of range: {raw}")))
}

fn optional_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn pass_flag<S: Serializer>(flag: &Option<bool>, serializer: S) -> Result<S::Ok, S::Error> {
    match flag {
        Some(passed) => serializer.serialize_u8(u8::from(*passed)),
        None => serializer.serialize_none(),
    }
}

/// One movie as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub title: String,
    #[serde(deserialize_with = "year_from_json")]
    pub year: i32,
    #[serde(
        rename = "imdbid",
        default,
        deserialize_with = "optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub imdb_id: Option<String>,
    pub rating: BechdelScore,
    /// Any other API fields (`id`, `dubious`, `date`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A movie after `process_movies`: `rating` is exposed as `Bechdel Score`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedMovieRecord {
    pub title: String,
    pub year: i32,
    #[serde(rename = "imdbid", skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    #[serde(rename = "Bechdel Score")]
    pub bechdel_score: BechdelScore,
    /// Set by `add_pass_test_column`; serialized as 1 / 0.
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "pass_flag")]
    pub pass_test: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Rows that `process_movies` accepts.
///
/// Already-processed rows convert to themselves, which makes
/// `process_movies` idempotent.
pub trait BechdelRow {
    fn to_processed(&self) -> ProcessedMovieRecord;
}

impl BechdelRow for MovieRecord {
    fn to_processed(&self) -> ProcessedMovieRecord {
        ProcessedMovieRecord {
            title: self.title.clone(),
            year: self.year,
            imdb_id: self.imdb_id.clone(),
            bechdel_score: self.rating,
            pass_test: None,
            extra: self.extra.clone(),
        }
    }
}

impl BechdelRow for ProcessedMovieRecord {
    fn to_processed(&self) -> ProcessedMovieRecord {
        self.clone()
    }
}

/// Rename `rating` to `Bechdel Score` and keep movies released after 1967.
pub fn process_movies<R: BechdelRow>(table: &Table<R>) -> Table<ProcessedMovieRecord> {
    table.filter_map(|row| {
        let processed = row.to_processed();
        (processed.year > MIN_YEAR_EXCLUSIVE).then_some(processed)
    })
}

/// Set `pass_test` on every row: 1 when the score is 3, else 0.
pub fn add_pass_test_column(table: &Table<ProcessedMovieRecord>) -> Table<ProcessedMovieRecord> {
    table
        .iter()
        .map(|row| ProcessedMovieRecord {
            pass_test: Some(row.bechdel_score.passes()),
            ..row.clone()
        })
        .collect()
}

/// Client for the Bechdel-test REST API.
pub struct MovieApiClient {
    base_url: String,
    client: HttpClient,
}

impl MovieApiClient {
    pub fn new(base_url: &str, http: &HttpConfig) -> HarvestResult<Self> {
        url::Url::parse(base_url).map_err(|source| HarvestError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: HttpClient::new(http)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Every movie the API knows about.
    pub async fn fetch_all_movies(&self) -> HarvestResult<Table<MovieRecord>> {
        let body = self.request("getAllMovies", &[]).await?;
        decode::<Vec<MovieRecord>>("getAllMovies", &body).map(Table::new)
    }

    /// Movies whose title matches `title`.
    pub async fn fetch_movies_by_title(&self, title: &str) -> HarvestResult<Table<MovieRecord>> {
        let body = self
            .request("getMoviesByTitle", &[("title", title)])
            .await?;
        decode::<Vec<MovieRecord>>("getMoviesByTitle", &body).map(Table::new)
    }

    /// The single movie with this IMDb id (digits only, no `tt` prefix).
    pub async fn fetch_movie_by_imdb_id(&self, imdb_id: &str) -> HarvestResult<Table<MovieRecord>> {
        let body = self
            .request("getMovieByImdbId", &[("imdbid", imdb_id)])
            .await?;
        decode::<MovieRecord>("getMovieByImdbId", &body).map(Table::single)
    }

    async fn request(&self, endpoint: &str, query: &[(&str, &str)]) -> HarvestResult<String> {
        let url = format!("{}/{endpoint}", self.base_url);
        let response = self.client.get(&url, query).await?.error_for_status()?;
        Ok(response.body)
    }
}

fn decode<T: serde::de::DeserializeOwned>(endpoint: &str, body: &str) -> HarvestResult<T> {
    serde_json::from_str(body).map_err(|e| {
        if e.is_data() {
            HarvestError::DataShape(format!("{endpoint}: {e}"))
        } else {
            HarvestError::Parse(format!("{endpoint}: invalid JSON: {e}"))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn movies(value: Value) -> Table<MovieRecord> {
        Table::new(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn test_decode_string_and_numeric_encodings() {
        let table = movies(json!([
            {
                "title": "The Matrix", "year": "1999", "rating": "3",
                "imdbid": "0133093", "id": "1234", "dubious": "0"
            },
            {"title": "Nosferatu", "year": 1922, "rating": 0, "imdbid": null, "id": 99}
        ]));

        let matrix = &table.rows()[0];
        assert_eq!(matrix.year, 1999);
        assert_eq!(matrix.rating, BechdelScore::Passes);
        assert_eq!(matrix.imdb_id.as_deref(), Some("0133093"));
        assert_eq!(matrix.extra["dubious"], json!("0"));
        assert!(!matrix.extra.contains_key("rating"));

        let nosferatu = &table.rows()[1];
        assert_eq!(nosferatu.rating, BechdelScore::FewerThanTwoWomen);
        assert_eq!(nosferatu.imdb_id, None);
    }

    #[test]
    fn test_schema_mismatch_is_data_shape() {
        let err = decode::<Vec<MovieRecord>>(
            "getAllMovies",
            r#"[{"title":"X","year":"2001","rating":7}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, HarvestError::DataShape(_)));

        let err = decode::<Vec<MovieRecord>>("getAllMovies", r#"[{"title":"X","rating":1}]"#)
            .unwrap_err();
        assert!(matches!(err, HarvestError::DataShape(_)));

        let err = decode::<Vec<MovieRecord>>("getAllMovies", "[{").unwrap_err();
        assert!(matches!(err, HarvestError::Parse(_)));
    }

    #[test]
    fn test_process_movies_renames_and_filters() {
        let table = movies(json!([
            {"title": "Matrix", "year": "1999", "rating": 3},
            {"title": "Bonnie and Clyde", "year": "1967", "rating": 1},
            {"title": "2001: A Space Odyssey", "year": 1968, "rating": 0}
        ]));

        let processed = process_movies(&table);
        assert_eq!(processed.len(), 2);
        assert_eq!(processed.rows()[0].title, "Matrix");
        assert_eq!(processed.rows()[1].year, 1968);

        let columns = processed.columns().unwrap();
        assert!(columns.contains_key("Bechdel Score"));
        assert!(!columns.contains_key("rating"));
        assert_eq!(columns["Bechdel Score"], vec![json!(3), json!(0)]);
    }

    #[test]
    fn test_process_movies_is_idempotent() {
        let table = movies(json!([
            {"title": "Alien", "year": 1979, "rating": 3, "id": 5},
            {"title": "Psycho", "year": 1960, "rating": 2}
        ]));

        let once = process_movies(&table);
        let twice = process_movies(&once);
        assert_eq!(once, twice);
        assert!(twice.column("Bechdel Score").is_ok());
        assert_eq!(twice.rows()[0].extra["id"], json!(5));
    }

    #[test]
    fn test_pass_test_column() {
        let table = movies(json!([
            {"title": "A", "year": 2000, "rating": 3},
            {"title": "B", "year": 2001, "rating": 2},
            {"title": "C", "year": 2002, "rating": 1},
            {"title": "D", "year": 2003, "rating": 0}
        ]));

        let processed = add_pass_test_column(&process_movies(&table));
        let flags: Vec<Option<bool>> = processed.iter().map(|r| r.pass_test).collect();
        assert_eq!(flags, vec![Some(true), Some(false), Some(false), Some(false)]);
        assert_eq!(
            processed.column("pass_test").unwrap(),
            vec![json!(1), json!(0), json!(0), json!(0)]
        );
    }

    #[test]
    fn test_pass_test_absent_until_added() {
        let processed = process_movies(&movies(json!([{"title": "A", "year": 2000, "rating": 3}])));
        assert!(processed.column("pass_test").is_err());
    }

    #[test]
    fn test_score_ordering() {
        assert!(BechdelScore::Passes > BechdelScore::TalkAboutMen);
        assert!(BechdelScore::Passes.passes());
        assert!(!BechdelScore::TalkAboutMen.passes());
        assert_eq!(BechdelScore::ALL.map(BechdelScore::value), [0, 1, 2, 3]);
        assert!(BechdelScore::try_from(4_i64).is_err());
        assert!(BechdelScore::try_from(-1_i64).is_err());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client =
            MovieApiClient::new("http://bechdeltest.com/api/v1/", &HttpConfig::default()).unwrap();
        assert_eq!(client.base_url(), "http://bechdeltest.com/api/v1");
        assert!(MovieApiClient::new("::", &HttpConfig::default()).is_err());
    }
}
