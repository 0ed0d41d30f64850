use serde_json::Value;
use thiserror::Error;

use crate::stats_fetch::RawDataset;

pub const PLAYER_CAREER_COLUMNS: &[&str] = &["GP", "GS", "PTS"];

pub const TEAM_RECENT_COLUMNS: &[&str] = &[
    "GAME_DATE", "MATCHUP", "WL", "PTS", "FGM", "FGA", "FG3M", "FG3A", "FTM", "FTA", "OREB",
    "DREB", "AST", "STL", "BLK", "TOV", "PF",
];

pub const RECENT_GAMES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionError {
    #[error("{dataset} has no {field} column")]
    MissingField { dataset: String, field: String },
    #[error("{field} row {row} is not numeric")]
    NotNumeric { field: String, row: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplayTable {
    pub columns: Vec<Column>,
}

/// Picks the `wanted` fields out of `raw` in the order given, keeping source row order.
pub fn project(raw: &RawDataset, wanted: &[&str]) -> Result<DisplayTable, ProjectionError> {
    let indices = wanted
        .iter()
        .map(|field| {
            raw.column_index(field)
                .ok_or_else(|| ProjectionError::MissingField {
                    dataset: raw.name.clone(),
                    field: (*field).to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let columns = wanted
        .iter()
        .zip(indices)
        .map(|(field, idx)| Column {
            name: (*field).to_string(),
            values: raw.rows.iter().map(|row| row[idx].clone()).collect(),
        })
        .collect();

    Ok(DisplayTable { columns })
}

impl DisplayTable {
    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Right-aligned monospace rendering, header first, two spaces between
    /// columns.
    pub fn to_text(&self) -> String {
        let cells: Vec<Vec<String>> = self
            .columns
            .iter()
            .map(|c| c.values.iter().map(cell_text).collect())
            .collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .zip(&cells)
            .map(|(col, values)| {
                values
                    .iter()
                    .map(|v| v.chars().count())
                    .chain(std::iter::once(col.name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut lines = Vec::with_capacity(self.row_count() + 1);
        lines.push(join_row(
            self.columns.iter().map(|c| c.name.as_str()),
            &widths,
        ));
        for row in 0..self.row_count() {
            lines.push(join_row(
                cells.iter().map(|values| values[row].as_str()),
                &widths,
            ));
        }
        lines.join("\n")
    }

    /// The text table fenced as a preformatted chat block.
    pub fn to_code_block(&self) -> String {
        format!("```\n{}\n```", self.to_text())
    }
}

fn join_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:>width$}"))
        .collect::<Vec<_>>()
        .join("  ")
}

pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub x_labels: Vec<String>,
    pub y_values: Vec<f64>,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.y_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y_values.is_empty()
    }

    pub fn from_table(
        table: &DisplayTable,
        label_field: &str,
        value_field: &str,
    ) -> Result<Self, ProjectionError> {
        let missing = |field: &str| ProjectionError::MissingField {
            dataset: "display table".to_string(),
            field: field.to_string(),
        };
        let labels = table.column(label_field).ok_or_else(|| missing(label_field))?;
        let values = table.column(value_field).ok_or_else(|| missing(value_field))?;

        let y_values = values
            .values
            .iter()
            .enumerate()
            .map(|(row, v)| {
                v.as_f64().ok_or_else(|| ProjectionError::NotNumeric {
                    field: value_field.to_string(),
                    row,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            x_labels: labels.values.iter().map(cell_text).collect(),
            y_values,
        })
    }
}
