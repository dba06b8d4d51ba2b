pub mod columns;
pub mod converter;
pub mod error;
pub mod geodesy;
pub mod grid;
pub mod model;
pub mod rasterize;
pub mod reader;
pub mod writer;

pub use columns::{resolve_latlon_columns, LatLonColumns};
pub use converter::{BatchReport, ConvertConfig, Csv2Tif};
pub use error::{ErrorKind, Result, Vec2TifError};
pub use grid::{compute_grid, RasterGrid};
pub use model::{AttributeTable, Band, OutputRaster, Point, PointTable, NODATA_VALUE};
pub use writer::GeoTiffWriter;
