use gdal::raster::Buffer;
use gdal::spatial_ref::SpatialRef;
use gdal::{DriverManager, Metadata};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{RasterContext, Result, Vec2TifError};
use crate::model::OutputRaster;

#[derive(Debug, Default, Clone)]
pub struct GeoTiffWriter {
    source_name: Option<String>,
}

impl GeoTiffWriter {
    pub fn new() -> Self {
        Self { source_name: None }
    }

    /// 出力ファイルのメタデータに入力ファイル名を残す
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    /// 全バンドを1つのGeoTIFFに書き出す。
    ///
    /// 失敗した場合は出力パスに何も残さず、既存のファイルも変更しない。
    pub fn write(&self, raster: &OutputRaster, output_path: &Path) -> Result<()> {
        let (rows, cols) = raster.shape();
        if rows == 0 || cols == 0 {
            return Err(Vec2TifError::invalid_input(format!(
                "Refusing to write an empty raster ({} x {}) to {:?}",
                cols, rows, output_path
            )));
        }
        if raster.bands.is_empty() {
            return Err(Vec2TifError::invalid_input(format!(
                "No attribute bands to write to {:?}",
                output_path
            )));
        }
        if let Some(band) = raster.bands.iter().find(|b| b.values.len() != cols * rows) {
            return Err(Vec2TifError::invalid_input(format!(
                "Band '{}' has {} values, expected {}",
                band.name,
                band.values.len(),
                cols * rows
            )));
        }

        tracing::info!(
            "Writing GeoTIFF: {} x {} pixels, {} bands",
            cols,
            rows,
            raster.band_count()
        );

        // 座標系を設定（ファイル作成前に検証する）
        let srs = SpatialRef::from_epsg(raster.crs_code)
            .context(format!("Failed to create SpatialRef from EPSG:{}", raster.crs_code))?;
        let wkt = srs.to_wkt().context("Failed to convert SpatialRef to WKT")?;

        // 一時ファイルに書き出し、成功した場合のみ出力パスに置き換える
        let partial_path = partial_path_for(output_path);
        let result = self
            .write_dataset(raster, &wkt, &partial_path)
            .and_then(|()| fs::rename(&partial_path, output_path).map_err(Vec2TifError::from));
        if result.is_err() && partial_path.exists() {
            if let Err(e) = fs::remove_file(&partial_path) {
                tracing::warn!("Failed to remove partial file {:?}: {}", partial_path, e);
            }
        }
        result
    }

    /// データセットはこの関数を抜けた時点で閉じられる（エラー時も含む）
    fn write_dataset(&self, raster: &OutputRaster, wkt: &str, path: &Path) -> Result<()> {
        let (rows, cols) = raster.shape();

        // GTiffドライバーを取得
        let driver =
            DriverManager::get_driver_by_name("GTiff").context("Failed to get GTiff driver")?;

        // データセットを作成
        let mut dataset = driver
            .create_with_band_type::<f32, _>(path, cols, rows, raster.band_count())
            .context("Failed to create dataset")?;

        // ジオトランスフォームを設定
        dataset
            .set_geo_transform(&raster.grid.transform)
            .context("Failed to set geo transform")?;

        dataset.set_projection(wkt).context("Failed to set projection")?;

        if let Some(source) = &self.source_name {
            dataset
                .set_metadata_item("SOURCE", source, "")
                .context("Failed to set source metadata")?;
        }

        // バンドにデータを書き込み（GDALは行優先順を期待）
        for (i, band_data) in raster.bands.iter().enumerate() {
            let index = i + 1;
            let mut band = dataset
                .rasterband(index)
                .context(format!("Failed to get raster band {}", index))?;

            band.set_no_data_value(Some(raster.nodata as f64))
                .context("Failed to set no data value")?;
            band.set_description(&band_data.name)
                .context(format!("Failed to set description of band {}", index))?;

            let mut buffer = Buffer::new((cols, rows), band_data.values.clone());
            band.write((0, 0), (cols, rows), &mut buffer)
                .context(format!("Failed to write band {} ({})", index, band_data.name))?;
        }

        Ok(())
    }
}

/// 出力と同じディレクトリに置く書き込み途中のファイル
fn partial_path_for(output_path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(output_path.file_name().unwrap_or_default());
    name.push(".partial");
    output_path.with_file_name(name)
}
