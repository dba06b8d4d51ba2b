use pyo3::exceptions::{PyIOError, PyKeyError, PyValueError};
use pyo3::prelude::*;
use std::path::{Path, PathBuf};
use ::vec2tif::model::Point;
use ::vec2tif::{
    compute_grid, resolve_latlon_columns, ConvertConfig, Csv2Tif, ErrorKind, Vec2TifError,
};

#[pymodule]
fn vec2tif(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyRasterGrid>()?;
    m.add_class::<PyCsv2Tif>()?;
    m.add_function(wrap_pyfunction!(get_latlon_names, m)?)?;
    m.add_function(wrap_pyfunction!(raster_grid, m)?)?;
    m.add_function(wrap_pyfunction!(convert_csv, m)?)?;
    Ok(())
}

fn to_py_err(err: Vec2TifError) -> PyErr {
    match err.kind() {
        ErrorKind::MissingField => PyErr::new::<PyKeyError, _>(err.to_string()),
        ErrorKind::InvalidInput => PyErr::new::<PyValueError, _>(err.to_string()),
        ErrorKind::IoFailure => PyErr::new::<PyIOError, _>(err.to_string()),
    }
}

#[pyclass(name = "RasterGrid")]
#[derive(Clone)]
pub struct PyRasterGrid {
    #[pyo3(get)]
    pub width: usize,
    #[pyo3(get)]
    pub height: usize,
    #[pyo3(get)]
    pub transform: (f64, f64, f64, f64, f64, f64),
}

#[pymethods]
impl PyRasterGrid {
    fn __repr__(&self) -> String {
        format!(
            "RasterGrid(width={}, height={}, transform={:?})",
            self.width, self.height, self.transform
        )
    }
}

/// 緯度・経度列の (index, name) を返す
#[pyfunction]
pub fn get_latlon_names(columns: Vec<String>) -> PyResult<((usize, String), (usize, String))> {
    let resolved = resolve_latlon_columns(&columns).map_err(to_py_err)?;
    Ok((
        (resolved.lat.index, resolved.lat.name),
        (resolved.lng.index, resolved.lng.name),
    ))
}

#[pyfunction]
pub fn raster_grid(lons: Vec<f64>, lats: Vec<f64>, resolution: f64) -> PyResult<PyRasterGrid> {
    if lons.len() != lats.len() {
        return Err(PyErr::new::<PyValueError, _>(format!(
            "lons and lats must have the same length ({} != {})",
            lons.len(),
            lats.len()
        )));
    }
    let points: Vec<Point> = lons
        .into_iter()
        .zip(lats)
        .map(|(lon, lat)| Point::new(lon, lat))
        .collect();

    let grid = compute_grid(&points, resolution).map_err(to_py_err)?;
    let t = grid.transform;
    Ok(PyRasterGrid {
        width: grid.width,
        height: grid.height,
        transform: (t[0], t[1], t[2], t[3], t[4], t[5]),
    })
}

#[pyfunction]
pub fn convert_csv(
    input_path: &str,
    output_path: &str,
    crs_code: u32,
    resolution: f64,
) -> PyResult<()> {
    let config = ConvertConfig::new(crs_code, resolution).map_err(to_py_err)?;
    Csv2Tif::new(vec![], config)
        .convert_csv(Path::new(input_path), Path::new(output_path))
        .map_err(to_py_err)
}

#[pyclass(name = "Csv2Tif")]
pub struct PyCsv2Tif {
    inner: Csv2Tif,
}

#[pymethods]
impl PyCsv2Tif {
    #[new]
    fn new(input_file_list: Vec<String>, crs_code: u32, resolution: f64) -> PyResult<Self> {
        let config = ConvertConfig::new(crs_code, resolution).map_err(to_py_err)?;
        let inputs = input_file_list.into_iter().map(PathBuf::from).collect();
        Ok(Self {
            inner: Csv2Tif::new(inputs, config),
        })
    }

    #[getter]
    fn n_inputs(&self) -> usize {
        self.inner.inputs().len()
    }

    fn execute_one(&self, input_file_name: &str) -> PyResult<String> {
        let output = self
            .inner
            .execute_one(Path::new(input_file_name))
            .map_err(to_py_err)?;
        Ok(output.to_string_lossy().into_owned())
    }

    /// 全入力を順に変換し、出力ファイル名のリストを返す。失敗した入力があれば最初の失敗を例外として送出する
    fn execute_all(&self) -> PyResult<Vec<String>> {
        let report = self.inner.execute_all();
        if let Some((_, err)) = report.failed.into_iter().next() {
            return Err(to_py_err(err));
        }
        Ok(report
            .converted
            .into_iter()
            .map(|(_, output)| output.to_string_lossy().into_owned())
            .collect())
    }
}
