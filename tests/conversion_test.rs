use gdal::{Dataset, DriverManager};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vec2tif::grid::degrees_per_cell;
use vec2tif::model::{GeoBounds, Point};
use vec2tif::rasterize::rasterize_point_table;
use vec2tif::{
    AttributeTable, ConvertConfig, Csv2Tif, ErrorKind, GeoTiffWriter, OutputRaster, PointTable,
    RasterGrid, NODATA_VALUE,
};

fn gdal_available() -> bool {
    DriverManager::get_driver_by_name("GTiff").is_ok()
}

fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn read_band(path: &Path, index: usize) -> Vec<f32> {
    let dataset = Dataset::open(path).unwrap();
    let band = dataset.rasterband(index).unwrap();
    band.read_band_as::<f32>().unwrap().data().to_vec()
}

/// 基準点から東・北にセル数分ずらした点群のCSV
fn grid_csv(resolution: f64) -> String {
    let reference = Point::new(139.0, 35.0);
    let unit = degrees_per_cell(reference, resolution);
    let east = 139.0 + unit.lon * 4.5;
    let north = 35.0 + unit.lat * 3.5;
    let mid_lon = 139.0 + unit.lon * 1.5;
    let mid_lat = 35.0 + unit.lat * 1.5;
    format!(
        "Latitude,Longitude,temp,depth\n\
         35.0,139.0,1.5,10\n\
         {north},{east},2.5,20\n\
         {mid_lat},{mid_lon},3.5,\n\
         {mid_lat},{mid_lon},4.5,40\n"
    )
}

#[test]
fn test_end_to_end_conversion() {
    if !gdal_available() {
        eprintln!("Skipping test: GTiff driver not available in bundled GDAL");
        return;
    }
    let temp_dir = TempDir::new().unwrap();
    let input = write_csv(temp_dir.path(), "survey.CSV", &grid_csv(50.0));

    let config = ConvertConfig::new(4326, 50.0).unwrap();
    let converter = Csv2Tif::new(vec![input.clone()], config);
    let output = converter.execute_one(&input).unwrap();

    assert_eq!(output, temp_dir.path().join("survey.tif"));

    let dataset = Dataset::open(&output).unwrap();
    assert_eq!(dataset.raster_size(), (4, 3));
    assert_eq!(dataset.raster_count(), 2);
    assert!(dataset.projection().contains("4326"));

    let transform = dataset.geo_transform().unwrap();
    assert_eq!(transform[0], 139.0);
    assert!(transform[5] < 0.0);

    let temp = read_band(&output, 1);
    assert_eq!(temp.len(), 12);
    // 左下と右上の角
    assert_eq!(temp[2 * 4], 1.5);
    assert_eq!(temp[3], 2.5);
    // 同じセルに落ちた2点は後の行が勝つ
    let mid_cells: Vec<f32> = temp
        .iter()
        .copied()
        .filter(|&v| v == 3.5 || v == 4.5)
        .collect();
    assert_eq!(mid_cells, vec![4.5]);

    let depth = read_band(&output, 2);
    assert!(depth.contains(&40.0));
    assert!(depth.iter().all(|v| !v.is_nan()));
}

#[test]
fn test_conversion_is_idempotent() {
    if !gdal_available() {
        eprintln!("Skipping test: GTiff driver not available in bundled GDAL");
        return;
    }
    let temp_dir = TempDir::new().unwrap();
    let input = write_csv(temp_dir.path(), "points.csv", &grid_csv(25.0));
    let first = temp_dir.path().join("first.tif");
    let second = temp_dir.path().join("second.tif");

    let converter = Csv2Tif::new(vec![], ConvertConfig::new(4326, 25.0).unwrap());
    converter.convert_csv(&input, &first).unwrap();
    converter.convert_csv(&input, &second).unwrap();

    let a = Dataset::open(&first).unwrap();
    let b = Dataset::open(&second).unwrap();
    assert_eq!(a.raster_size(), b.raster_size());
    assert_eq!(a.geo_transform().unwrap(), b.geo_transform().unwrap());

    for index in 1..=2 {
        let band_a = a.rasterband(index).unwrap();
        let band_b = b.rasterband(index).unwrap();
        assert_eq!(band_a.no_data_value(), Some(NODATA_VALUE as f64));
        assert_eq!(band_a.no_data_value(), band_b.no_data_value());

        let data_a = read_band(&first, index);
        let data_b = read_band(&second, index);
        let bits_a: Vec<u32> = data_a.iter().map(|v| v.to_bits()).collect();
        let bits_b: Vec<u32> = data_b.iter().map(|v| v.to_bits()).collect();
        assert_eq!(bits_a, bits_b);
    }
}

#[test]
fn test_single_point_with_explicit_grid() {
    if !gdal_available() {
        eprintln!("Skipping test: GTiff driver not available in bundled GDAL");
        return;
    }
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("single.tif");

    let csv = "lat,lng,a,b,c\n35.0005,139.0005,1,2,3\n";
    let table = vec2tif::reader::read_csv_table(csv.as_bytes()).unwrap();
    let points = PointTable::from_table(&table).unwrap();

    let bounds = GeoBounds {
        min_lon: 139.0,
        min_lat: 35.0,
        max_lon: 139.003,
        max_lat: 35.003,
    };
    let grid = RasterGrid::from_bounds(&bounds, 3, 3).unwrap();
    let bands = rasterize_point_table(&points, &grid, NODATA_VALUE).unwrap();
    let raster = OutputRaster {
        grid,
        bands,
        crs_code: 4326,
        nodata: NODATA_VALUE,
    };
    GeoTiffWriter::new().write(&raster, &output).unwrap();

    let dataset = Dataset::open(&output).unwrap();
    assert_eq!(dataset.raster_count(), 3);
    for (index, expected) in [(1, 1.0), (2, 2.0), (3, 3.0)] {
        let data = read_band(&output, index);
        let cells: Vec<(usize, f32)> = data
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, v)| v != NODATA_VALUE)
            .collect();
        // 左下のセル（行2, 列0）
        assert_eq!(cells, vec![(6, expected)]);
    }
}

#[test]
fn test_single_row_table_is_invalid_input() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_csv(temp_dir.path(), "one.csv", "lat,lng,v\n35.0,139.0,1\n");

    let converter = Csv2Tif::new(vec![], ConvertConfig::new(4326, 10.0).unwrap());
    let err = converter.execute_one(&input).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(!temp_dir.path().join("one.tif").exists());
}

#[test]
fn test_coarse_resolution_is_invalid_input() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_csv(
        temp_dir.path(),
        "narrow.csv",
        "lat,lng,val\n35.0,139.0,10\n35.0,139.0005,20\n",
    );

    let converter = Csv2Tif::new(vec![], ConvertConfig::new(4326, 50.0).unwrap());
    let err = converter.execute_one(&input).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(err.to_string().contains("zero"));
    assert!(!temp_dir.path().join("narrow.tif").exists());
}

#[test]
fn test_missing_longitude_column() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_csv(temp_dir.path(), "nolng.csv", "lat,x,v\n35.0,139.0,1\n");

    let converter = Csv2Tif::new(vec![], ConvertConfig::default());
    let err = converter.execute_one(&input).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MissingField);
    assert!(err.to_string().contains("longitude"));
}

#[test]
fn test_batch_continues_after_failure() {
    if !gdal_available() {
        eprintln!("Skipping test: GTiff driver not available in bundled GDAL");
        return;
    }
    let temp_dir = TempDir::new().unwrap();
    let good = write_csv(temp_dir.path(), "good.csv", &grid_csv(50.0));
    let bad_ext = write_csv(temp_dir.path(), "bad.txt", &grid_csv(50.0));
    let missing = temp_dir.path().join("missing.csv");
    let also_good = write_csv(temp_dir.path(), "also_good.csv", &grid_csv(50.0));

    let inputs = vec![good.clone(), bad_ext.clone(), missing.clone(), also_good.clone()];
    let converter = Csv2Tif::new(inputs, ConvertConfig::new(4326, 50.0).unwrap());

    for report in [converter.execute_all(), converter.execute_all_parallel()] {
        assert!(!report.is_success());
        let converted: Vec<&PathBuf> = report.converted.iter().map(|(i, _)| i).collect();
        assert_eq!(converted, vec![&good, &also_good]);

        let failed: Vec<&PathBuf> = report.failed.iter().map(|(i, _)| i).collect();
        assert_eq!(failed, vec![&bad_ext, &missing]);
        assert!(report
            .failed
            .iter()
            .all(|(_, e)| e.kind() == ErrorKind::InvalidInput));
    }

    assert!(temp_dir.path().join("good.tif").exists());
    assert!(temp_dir.path().join("also_good.tif").exists());
}

#[test]
fn test_convert_normalized_table() {
    if !gdal_available() {
        eprintln!("Skipping test: GTiff driver not available in bundled GDAL");
        return;
    }
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("from_table.tif");

    // CSV以外の入力もこの形に正規化して渡す
    let table = AttributeTable::new(
        vec!["lng".to_string(), "value".to_string(), "lat".to_string()],
        vec![
            vec!["139.0".to_string(), "1".to_string(), "35.0".to_string()],
            vec!["139.01".to_string(), "2".to_string(), "35.01".to_string()],
        ],
    );
    let points = PointTable::from_table(&table).unwrap();

    let converter = Csv2Tif::new(vec![], ConvertConfig::new(6668, 100.0).unwrap());
    converter.convert_table(&points, &output).unwrap();

    let dataset = Dataset::open(&output).unwrap();
    assert_eq!(dataset.raster_count(), 1);
    let data = read_band(&output, 1);
    assert_eq!(data.iter().filter(|&&v| v != NODATA_VALUE).count(), 2);
}
