use crate::error::{Result, Vec2TifError};
use crate::grid::RasterGrid;
use crate::model::{AttributeColumn, Band, Point, PointTable};

/// 点が接するセル (列, 行) を列挙する。
///
/// セル境界上の点は両側のセルに接する（all-touched）。グリッド外のセルは除く。
pub fn touched_cells(grid: &RasterGrid, point: Point) -> Vec<(usize, usize)> {
    let (fx, fy) = grid.to_pixel(point);
    let cols = touched_indices(fx, grid.width);
    let rows = touched_indices(fy, grid.height);

    let mut cells = Vec::with_capacity(cols.len() * rows.len());
    for &row in &rows {
        for &col in &cols {
            cells.push((col, row));
        }
    }
    cells
}

/// 境界上とみなすピクセル座標の許容誤差（相対）
const EDGE_EPSILON: f64 = 1e-9;

fn touched_indices(f: f64, size: usize) -> Vec<usize> {
    if !f.is_finite() {
        return Vec::new();
    }
    let nearest = f.round();
    let mut indices = Vec::with_capacity(2);
    if (f - nearest).abs() <= EDGE_EPSILON * nearest.abs().max(1.0) {
        indices.push(nearest - 1.0);
        indices.push(nearest);
    } else {
        indices.push(f.floor());
    }

    indices
        .into_iter()
        .filter(|&i| i >= 0.0 && i < size as f64)
        .map(|i| i as usize)
        .collect()
}

/// 1列分の値をラスタに焼き込む。同じセルに複数の点が入る場合は後の行の値で上書きする
pub fn rasterize_points(
    points: &[Point],
    values: &[f64],
    grid: &RasterGrid,
    nodata: f32,
) -> Result<Vec<f32>> {
    if grid.width == 0 || grid.height == 0 {
        return Err(Vec2TifError::invalid_input(format!(
            "Cannot rasterize into an empty grid ({}x{})",
            grid.width, grid.height
        )));
    }
    if points.len() != values.len() {
        return Err(Vec2TifError::invalid_input(format!(
            "Point count {} does not match value count {}",
            points.len(),
            values.len()
        )));
    }

    let mut data = vec![nodata; grid.cell_count()];
    let mut outside = 0usize;

    for (point, &value) in points.iter().zip(values) {
        let cells = touched_cells(grid, *point);
        if cells.is_empty() {
            outside += 1;
            continue;
        }
        for (col, row) in cells {
            data[row * grid.width + col] = value as f32;
        }
    }

    if outside > 0 {
        tracing::warn!("{} points fall outside the raster grid", outside);
    }

    Ok(data)
}

pub fn rasterize_column(
    points: &[Point],
    column: &AttributeColumn,
    grid: &RasterGrid,
    nodata: f32,
) -> Result<Band> {
    let values = rasterize_points(points, &column.values, grid, nodata)?;
    let band = Band {
        name: column.name.clone(),
        values,
    };
    tracing::debug!(
        "Burned band '{}': {} of {} cells have data",
        band.name,
        band.data_cell_count(),
        grid.cell_count()
    );
    Ok(band)
}

/// 属性列ごとに1バンドを作る（列順）
pub fn rasterize_point_table(
    table: &PointTable,
    grid: &RasterGrid,
    nodata: f32,
) -> Result<Vec<Band>> {
    table
        .attributes
        .iter()
        .map(|column| rasterize_column(&table.points, column, grid, nodata))
        .collect()
}
