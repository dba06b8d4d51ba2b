use crate::grid::RasterGrid;

pub const NODATA_VALUE: f32 = -9999.0;

/// ヘッダー付きの表データ（値は未解釈の文字列）
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl AttributeTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub lon: f64,
    pub lat: f64,
}

impl Point {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBounds {
    /// 全点を含む最小の矩形。点が無ければNone
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = GeoBounds {
            min_lon: first.lon,
            min_lat: first.lat,
            max_lon: first.lon,
            max_lat: first.lat,
        };
        for p in &points[1..] {
            bounds.min_lon = bounds.min_lon.min(p.lon);
            bounds.min_lat = bounds.min_lat.min(p.lat);
            bounds.max_lon = bounds.max_lon.max(p.lon);
            bounds.max_lat = bounds.max_lat.max(p.lat);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }
}

/// 座標以外の列（1列が1バンドになる）
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeColumn {
    pub name: String,
    pub values: Vec<f64>,
}

/// 点ジオメトリと属性列に正規化された表。
///
/// CSV以外の入力形式もこの形に変換してから変換処理に渡す。
#[derive(Debug, Clone, PartialEq)]
pub struct PointTable {
    pub points: Vec<Point>,
    pub attributes: Vec<AttributeColumn>,
}

impl PointTable {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn bounds(&self) -> Option<GeoBounds> {
        GeoBounds::from_points(&self.points)
    }

    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes.iter().map(|c| c.name.as_str()).collect()
    }
}

/// 1バンド分のラスタ（行優先、shape = (height, width)）
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub name: String,
    pub values: Vec<f32>,
}

impl Band {
    pub fn get(&self, grid: &RasterGrid, col: usize, row: usize) -> Option<f32> {
        if col >= grid.width || row >= grid.height {
            return None;
        }
        self.values.get(row * grid.width + col).copied()
    }

    pub fn data_cell_count(&self) -> usize {
        self.values.iter().filter(|&&v| v != NODATA_VALUE).count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputRaster {
    pub grid: RasterGrid,
    pub bands: Vec<Band>,
    pub crs_code: u32,
    pub nodata: f32,
}

impl OutputRaster {
    pub fn shape(&self) -> (usize, usize) {
        (self.grid.height, self.grid.width)
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }
}
