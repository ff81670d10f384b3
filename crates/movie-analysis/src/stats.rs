//! Aggregate series for the chart renderer.
//!
//! Each function returns a `BarChart`: the grouping/value columns and labels
//! a renderer needs, plus the already-aggregated bars in ascending key order.

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::Serialize;

use crate::bechdel::{BechdelScore, ProcessedMovieRecord};
use crate::error::{HarvestError, HarvestResult};
use crate::ratings::RankedMovieRecord;
use crate::table::Table;

/// One bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

/// A bar chart description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub title: String,
    pub group_column: String,
    pub value_column: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<Bar>,
}

impl BarChart {
    fn new(
        title: &str,
        group_column: &str,
        value_column: &str,
        x_label: &str,
        y_label: &str,
    ) -> Self {
        Self {
            title: title.to_string(),
            group_column: group_column.to_string(),
            value_column: value_column.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            bars: Vec::new(),
        }
    }

    fn with_bars<K: Display>(mut self, groups: impl IntoIterator<Item = (K, f64)>) -> Self {
        self.bars = groups
            .into_iter()
            .map(|(k, value)| Bar {
                label: k.to_string(),
                value,
            })
            .collect();
        self
    }

    /// Largest bar value, or 0 for an empty chart.
    pub fn max_value(&self) -> f64 {
        self.bars.iter().map(|b| b.value).fold(0.0, f64::max)
    }
}

fn count_by<K: Ord>(keys: impl Iterator<Item = K>) -> BTreeMap<K, f64> {
    let mut counts = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0.0) += 1.0;
    }
    counts
}

/// Number of ranked movies per release year.
pub fn movies_by_year(table: &Table<RankedMovieRecord>) -> BarChart {
    BarChart::new("Number of Movies by Year", "year", "count", "Year", "Number of Movies")
        .with_bars(count_by(table.iter().map(|m| m.year)))
}

/// Mean Tomatometer score per release year.
pub fn average_score_by_year(table: &Table<RankedMovieRecord>) -> BarChart {
    let mut sums: BTreeMap<i32, (f64, u32)> = BTreeMap::new();
    for movie in table {
        let entry = sums.entry(movie.year).or_insert((0.0, 0));
        entry.0 += movie.score;
        entry.1 += 1;
    }

    BarChart::new("Average Satisfaction by Year", "year", "score", "Year", "Average Score")
        .with_bars(sums.into_iter().map(|(year, (sum, n))| (year, sum / f64::from(n))))
}

/// Movies per Bechdel score. Every score 0–3 gets a bar, empty ones at 0.
pub fn bechdel_score_counts(table: &Table<ProcessedMovieRecord>) -> BarChart {
    let mut counts = count_by(table.iter().map(|m| m.bechdel_score));
    for score in BechdelScore::ALL {
        counts.entry(score).or_insert(0.0);
    }

    BarChart::new("Bechdel Score", "Bechdel Score", "count", "Bechdel Score", "Count")
        .with_bars(counts)
}

/// Movies failing (0) and passing (1) the test.
///
/// Requires `add_pass_test_column` to have run.
pub fn pass_test_counts(table: &Table<ProcessedMovieRecord>) -> HarvestResult<BarChart> {
    let flags = table
        .iter()
        .enumerate()
        .map(|(i, m)| {
            m.pass_test.map(u8::from).ok_or_else(|| {
                HarvestError::DataShape(format!("row {i} has no column 'pass_test'"))
            })
        })
        .collect::<HarvestResult<Vec<u8>>>()?;

    let mut counts = count_by(flags.into_iter());
    counts.entry(0).or_insert(0.0);
    counts.entry(1).or_insert(0.0);

    Ok(
        BarChart::new("Pass Bechdel Test", "pass_test", "count", "Pass Bechdel Test", "Count")
            .with_bars(counts),
    )
}
