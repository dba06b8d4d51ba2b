use crate::error::{Result, Vec2TifError};
use crate::geodesy::{destination_point, Bearing};
use crate::model::{GeoBounds, Point};

/// 1バンドあたりの最大セル数（f32で4 GiB）
pub const MAX_CELL_COUNT: usize = 1 << 30;

/// GDAL順のアフィン変換 `[x0, dx, rx, y0, ry, dy]`
pub type GeoTransform = [f64; 6];

#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    pub width: usize,
    pub height: usize,
    pub transform: GeoTransform,
}

impl RasterGrid {
    /// 矩形の四隅とラスタの四隅が一致するように変換を作る（北が上）
    pub fn from_bounds(bounds: &GeoBounds, width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Vec2TifError::invalid_input(format!(
                "Raster grid must be at least 1x1, got {}x{}",
                width, height
            )));
        }
        match width.checked_mul(height) {
            Some(cells) if cells <= MAX_CELL_COUNT => {}
            _ => {
                return Err(Vec2TifError::invalid_input(format!(
                    "Raster grid {}x{} exceeds the limit of {} cells",
                    width, height, MAX_CELL_COUNT
                )));
            }
        }

        let transform = [
            bounds.min_lon,
            bounds.width() / width as f64,
            0.0,
            bounds.max_lat,
            0.0,
            -bounds.height() / height as f64,
        ];

        Ok(Self {
            width,
            height,
            transform,
        })
    }

    /// (x方向, y方向) のセルサイズ。yは負
    pub fn pixel_size(&self) -> (f64, f64) {
        (self.transform[1], self.transform[5])
    }

    pub fn bounds(&self) -> GeoBounds {
        let (dx, dy) = self.pixel_size();
        let max_lon = self.transform[0] + dx * self.width as f64;
        let min_lat = self.transform[3] + dy * self.height as f64;
        GeoBounds {
            min_lon: self.transform[0],
            min_lat,
            max_lon,
            max_lat: self.transform[3],
        }
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// 地理座標を小数のピクセル位置 (列, 行) に変換する
    pub fn to_pixel(&self, point: Point) -> (f64, f64) {
        let (dx, dy) = self.pixel_size();
        let fx = (point.lon - self.transform[0]) / dx;
        let fy = (point.lat - self.transform[3]) / dy;
        (fx, fy)
    }
}

/// 1セルあたりの度数（経度方向, 緯度方向）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DegreesPerCell {
    pub lon: f64,
    pub lat: f64,
}

/// 基準点から東・北へ resolution メートル進んだ地点との差分を求める
pub fn degrees_per_cell(reference: Point, resolution: f64) -> DegreesPerCell {
    let east = destination_point(reference, resolution, Bearing::East);
    let north = destination_point(reference, resolution, Bearing::North);
    DegreesPerCell {
        lon: east.lon - reference.lon,
        lat: north.lat - reference.lat,
    }
}

/// 点群と地上解像度（メートル）からラスタグリッドを求める。
///
/// セルサイズは行順で最初の点を基準に決まるため、行の並び替えで結果が変わる。
/// 幅・高さは切り捨てで求め、0になった場合は InvalidInput を返す。
pub fn compute_grid(points: &[Point], resolution: f64) -> Result<RasterGrid> {
    if !(resolution.is_finite() && resolution > 0.0) {
        return Err(Vec2TifError::invalid_input(format!(
            "Resolution must be a positive number, got {}",
            resolution
        )));
    }

    let bounds = GeoBounds::from_points(points)
        .ok_or_else(|| Vec2TifError::invalid_input("No points to rasterize"))?;
    let reference = points[0];
    let unit = degrees_per_cell(reference, resolution);

    tracing::debug!(
        "Degrees per cell at ({}, {}): lon={}, lat={}",
        reference.lon,
        reference.lat,
        unit.lon,
        unit.lat
    );

    let width_cells = (bounds.width() / unit.lon).floor();
    let height_cells = (bounds.height() / unit.lat).floor();

    // usizeへの変換で飽和しないよう、浮動小数のままセル数を確認する
    if !(width_cells * height_cells <= MAX_CELL_COUNT as f64) {
        return Err(Vec2TifError::invalid_input(format!(
            "Raster grid {}x{} exceeds the limit of {} cells: extent ({}, {}) degrees at {} m",
            width_cells,
            height_cells,
            MAX_CELL_COUNT,
            bounds.width(),
            bounds.height(),
            resolution
        )));
    }

    let width = width_cells as usize;
    let height = height_cells as usize;

    if width == 0 {
        return Err(Vec2TifError::invalid_input(format!(
            "Raster width is zero: longitude extent {} is smaller than one cell ({} degrees at {} m)",
            bounds.width(),
            unit.lon,
            resolution
        )));
    }
    if height == 0 {
        return Err(Vec2TifError::invalid_input(format!(
            "Raster height is zero: latitude extent {} is smaller than one cell ({} degrees at {} m)",
            bounds.height(),
            unit.lat,
            resolution
        )));
    }

    let grid = RasterGrid::from_bounds(&bounds, width, height)?;
    tracing::info!(
        "Raster grid: {} x {} pixels, pixel size ({}, {})",
        grid.width,
        grid.height,
        grid.transform[1],
        grid.transform[5]
    );

    Ok(grid)
}
