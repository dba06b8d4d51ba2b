use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::columns::resolve_latlon_columns;
use crate::error::{Result, Vec2TifError};
use crate::model::{AttributeColumn, AttributeTable, Point, PointTable};

/// ヘッダー行付きCSVを読み込む。
///
/// 値の前後の空白は取り除くが、列名はそのまま残す（`" lat"` は緯度列にならない）。
pub fn read_csv_table<R: Read>(reader: R) -> Result<AttributeTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Fields)
        .flexible(false)
        .from_reader(reader);

    let columns: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        rows.push(record.iter().map(|v| v.to_string()).collect());
    }

    Ok(AttributeTable::new(columns, rows))
}

pub fn read_csv_file(path: &Path) -> Result<AttributeTable> {
    let file = File::open(path)?;
    read_csv_table(file)
}

impl PointTable {
    /// 緯度・経度列を点ジオメトリに、残りの列を属性列に分ける。行の順序は保持する
    pub fn from_table(table: &AttributeTable) -> Result<Self> {
        let latlng = resolve_latlon_columns(&table.columns)?;

        if table.rows.is_empty() {
            return Err(Vec2TifError::invalid_input("Table has no rows"));
        }

        let mut attributes: Vec<AttributeColumn> = table
            .columns
            .iter()
            .enumerate()
            .filter(|(i, _)| !latlng.is_coordinate(*i))
            .map(|(_, name)| AttributeColumn {
                name: name.clone(),
                values: Vec::with_capacity(table.rows.len()),
            })
            .collect();

        let mut points = Vec::with_capacity(table.rows.len());
        for (row_index, row) in table.rows.iter().enumerate() {
            if row.len() != table.columns.len() {
                return Err(Vec2TifError::invalid_input(format!(
                    "Row {} has {} fields, expected {}",
                    row_index + 1,
                    row.len(),
                    table.columns.len()
                )));
            }

            let lon = parse_coordinate(&row[latlng.lng.index], row_index, &latlng.lng.name)?;
            let lat = parse_coordinate(&row[latlng.lat.index], row_index, &latlng.lat.name)?;
            points.push(Point::new(lon, lat));

            let values = row
                .iter()
                .enumerate()
                .filter(|(i, _)| !latlng.is_coordinate(*i))
                .map(|(_, v)| v);
            for (column, raw) in attributes.iter_mut().zip(values) {
                column
                    .values
                    .push(parse_attribute(raw, row_index, &column.name)?);
            }
        }

        Ok(PointTable { points, attributes })
    }
}

fn parse_coordinate(raw: &str, row_index: usize, column: &str) -> Result<f64> {
    let value: f64 = raw.trim().parse().map_err(|_| {
        Vec2TifError::invalid_input(format!(
            "Row {}, column '{}': coordinate '{}' is not a number",
            row_index + 1,
            column,
            raw
        ))
    })?;
    if !value.is_finite() {
        return Err(Vec2TifError::invalid_input(format!(
            "Row {}, column '{}': coordinate '{}' is not finite",
            row_index + 1,
            column,
            raw
        )));
    }
    Ok(value)
}

/// 空欄は欠損値（NaN）として扱う
fn parse_attribute(raw: &str, row_index: usize, column: &str) -> Result<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(f64::NAN);
    }
    raw.parse().map_err(|_| {
        Vec2TifError::invalid_input(format!(
            "Row {}, column '{}': value '{}' is not numeric",
            row_index + 1,
            column,
            raw
        ))
    })
}
