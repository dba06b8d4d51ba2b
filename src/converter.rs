use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Result, Vec2TifError};
use crate::grid::compute_grid;
use crate::model::{OutputRaster, PointTable, NODATA_VALUE};
use crate::rasterize::rasterize_point_table;
use crate::reader::read_csv_file;
use crate::writer::GeoTiffWriter;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvertConfig {
    /// 入力座標の解釈と出力のタグ付けに使うEPSGコード（再投影はしない）
    pub crs_code: u32,
    /// 1セルあたりの地上距離（メートル）
    pub resolution: f64,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            crs_code: 4326,
            resolution: 1.0,
        }
    }
}

impl ConvertConfig {
    pub fn new(crs_code: u32, resolution: f64) -> Result<Self> {
        let config = Self {
            crs_code,
            resolution,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(Vec2TifError::invalid_input(format!(
                "Resolution must be a positive number, got {}",
                self.resolution
            )));
        }
        Ok(())
    }
}

/// 点群テーブルからラスタを作る（ファイルには書かない）
pub fn build_raster(table: &PointTable, config: &ConvertConfig) -> Result<OutputRaster> {
    config.validate()?;
    if table.attributes.is_empty() {
        return Err(Vec2TifError::invalid_input(
            "Table has no attribute columns besides latitude/longitude",
        ));
    }

    let grid = compute_grid(&table.points, config.resolution)?;
    let bands = rasterize_point_table(table, &grid, NODATA_VALUE)?;

    Ok(OutputRaster {
        grid,
        bands,
        crs_code: config.crs_code,
        nodata: NODATA_VALUE,
    })
}

/// 入力と同じディレクトリ、同じファイル名で拡張子を .tif にしたパス
pub fn output_path_for(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    let mut file_name = stem.to_os_string();
    file_name.push(".tif");

    match output_dir {
        Some(dir) => dir.join(file_name),
        None => input.with_file_name(file_name),
    }
}

/// 入力ファイルの存在と拡張子（.csv、大文字小文字は区別しない）を確認する
pub fn validate_input(input: &Path) -> Result<()> {
    // シンボリックリンク自体の存在を確認
    if fs::symlink_metadata(input).is_err() {
        return Err(Vec2TifError::invalid_input(format!(
            "File not found! {:?}",
            input
        )));
    }
    if !is_csv_path(input) {
        return Err(Vec2TifError::invalid_input(format!(
            "File extension is invalid! Only 'csv' is available. {:?}",
            input
        )));
    }
    Ok(())
}

pub fn is_csv_path(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

/// ディレクトリ以下のCSVファイルを再帰的に収集する（パス順）
pub fn collect_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            files.extend(collect_csv_files(&path)?);
        } else if is_csv_path(&path) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

#[derive(Debug)]
pub struct BatchReport {
    pub converted: Vec<(PathBuf, PathBuf)>,
    pub failed: Vec<(PathBuf, Vec2TifError)>,
}

impl BatchReport {
    fn from_results(results: Vec<(PathBuf, Result<PathBuf>)>) -> Self {
        let mut report = BatchReport {
            converted: Vec::new(),
            failed: Vec::new(),
        };
        for (input, result) in results {
            match result {
                Ok(output) => report.converted.push((input, output)),
                Err(e) => {
                    warn!("Failed to convert {:?}: {}", input, e);
                    report.failed.push((input, e));
                }
            }
        }
        report
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// CSV（緯度・経度付き）をGeoTIFFに変換する
#[derive(Debug, Clone)]
pub struct Csv2Tif {
    inputs: Vec<PathBuf>,
    config: ConvertConfig,
    output_dir: Option<PathBuf>,
}

impl Csv2Tif {
    pub fn new(inputs: Vec<PathBuf>, config: ConvertConfig) -> Self {
        Self {
            inputs,
            config,
            output_dir: None,
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// 正規化済みのテーブルを変換して書き出す
    pub fn convert_table(&self, table: &PointTable, output_path: &Path) -> Result<()> {
        self.write_table(table, output_path, GeoTiffWriter::new())
    }

    pub fn convert_csv(&self, input: &Path, output_path: &Path) -> Result<()> {
        let table = read_csv_file(input)?;
        info!(
            "Read {:?}: {} rows, {} columns",
            input,
            table.row_count(),
            table.columns.len()
        );

        let points = PointTable::from_table(&table)?;
        let mut writer = GeoTiffWriter::new();
        if let Some(name) = input.file_name().and_then(|s| s.to_str()) {
            writer = writer.with_source_name(name);
        }
        self.write_table(&points, output_path, writer)
    }

    fn write_table(
        &self,
        table: &PointTable,
        output_path: &Path,
        writer: GeoTiffWriter,
    ) -> Result<()> {
        let raster = build_raster(table, &self.config)?;
        writer.write(&raster, output_path)?;
        info!("Written GeoTIFF: {:?}", output_path);
        Ok(())
    }

    /// 1ファイルを検証して変換し、出力パスを返す
    pub fn execute_one(&self, input: &Path) -> Result<PathBuf> {
        validate_input(input)?;

        let output_path = output_path_for(input, self.output_dir.as_deref());
        info!("Processing file: {:?}", input);
        self.convert_csv(input, &output_path)?;
        Ok(output_path)
    }

    /// 出力パスが先の入力と重なる入力について、その先の入力を返す。
    /// 検証に通らない入力は出力パスを確保しない
    fn output_collisions(&self) -> Vec<Option<PathBuf>> {
        let mut claimed: HashMap<PathBuf, &PathBuf> = HashMap::new();
        self.inputs
            .iter()
            .map(|input| {
                if validate_input(input).is_err() {
                    return None;
                }
                let output = output_path_for(input, self.output_dir.as_deref());
                match claimed.get(&output) {
                    Some(&first) => Some(first.clone()),
                    None => {
                        claimed.insert(output, input);
                        None
                    }
                }
            })
            .collect()
    }

    fn execute_checked(&self, input: &Path, collision: Option<&PathBuf>) -> Result<PathBuf> {
        if let Some(first) = collision {
            return Err(Vec2TifError::invalid_input(format!(
                "Output path {:?} is already used by {:?}",
                output_path_for(input, self.output_dir.as_deref()),
                first
            )));
        }
        self.execute_one(input)
    }

    /// 入力順に1つずつ変換する。失敗した入力があっても残りは続ける。
    /// 出力パスが先の入力と重なる入力は変換せずに失敗とする
    pub fn execute_all(&self) -> BatchReport {
        let collisions = self.output_collisions();
        let results = self
            .inputs
            .iter()
            .zip(&collisions)
            .map(|(input, collision)| {
                (input.clone(), self.execute_checked(input, collision.as_ref()))
            })
            .collect();
        BatchReport::from_results(results)
    }

    /// 入力ごとに並列で変換する。結果は入力順に並ぶ
    pub fn execute_all_parallel(&self) -> BatchReport {
        let collisions = self.output_collisions();
        let results = self
            .inputs
            .par_iter()
            .zip(collisions.par_iter())
            .map(|(input, collision)| {
                (input.clone(), self.execute_checked(input, collision.as_ref()))
            })
            .collect();
        BatchReport::from_results(results)
    }
}
