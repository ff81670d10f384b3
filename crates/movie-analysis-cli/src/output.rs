//! Text and JSON rendering of tables and chart series.

use std::collections::BTreeMap;

use anyhow::Result;
use movie_analysis::{BarChart, Table};
use serde::Serialize;
use serde_json::Value;

const BAR_WIDTH: usize = 40;
const MAX_CELL: usize = 48;

/// Print any serializable value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a table with aligned columns, or as JSON rows.
pub fn print_table<R: Serialize>(table: &Table<R>, json: bool, limit: Option<usize>) -> Result<()> {
    if json {
        return print_json(table);
    }
    if table.is_empty() {
        println!("(no rows)");
        return Ok(());
    }

    let columns = table.columns()?;
    let shown = limit.unwrap_or(table.len()).min(table.len());
    println!("{}", render_columns(&columns, shown));
    if shown < table.len() {
        println!("... {} more row(s)", table.len() - shown);
    }
    Ok(())
}

fn render_columns(columns: &BTreeMap<String, Vec<Value>>, rows: usize) -> String {
    let cells: Vec<(&String, Vec<String>)> = columns
        .iter()
        .map(|(name, values)| (name, values.iter().take(rows).map(cell).collect()))
        .collect();

    let widths: Vec<usize> = cells
        .iter()
        .map(|(name, values)| {
            values
                .iter()
                .map(|v| v.chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(rows + 1);
    lines.push(
        cells
            .iter()
            .zip(&widths)
            .map(|((name, _), &w)| format!("{name:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string(),
    );
    for row in 0..rows {
        lines.push(
            cells
                .iter()
                .zip(&widths)
                .map(|((_, values), &w)| format!("{:<w$}", values[row]))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string(),
        );
    }
    lines.join("\n")
}

fn cell(value: &Value) -> String {
    let text = match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.chars().count() > MAX_CELL {
        let cut: String = text.chars().take(MAX_CELL - 1).collect();
        format!("{cut}…")
    } else {
        text
    }
}

/// Print a bar chart as a horizontal text histogram.
pub fn print_chart(chart: &BarChart, json: bool) -> Result<()> {
    if json {
        return print_json(chart);
    }
    println!("{}", render_chart(chart));
    Ok(())
}

fn render_chart(chart: &BarChart) -> String {
    let mut out = format!("{}\n  {} by {}\n", chart.title, chart.y_label, chart.x_label);
    let max = chart.max_value();
    let label_width = chart
        .bars
        .iter()
        .map(|b| b.label.chars().count())
        .max()
        .unwrap_or(0);

    for bar in &chart.bars {
        let len = if max > 0.0 {
            ((bar.value / max) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        out.push_str(&format!(
            "  {:>label_width$} | {} {}\n",
            bar.label,
            "#".repeat(len),
            format_value(bar.value)
        ));
    }
    out
}

fn format_value(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.3}")
    }
}
