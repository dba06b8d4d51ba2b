use gdal::errors::GdalError;
use std::fmt;
use thiserror::Error;

/// 緯度・経度のどちらの軸か
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::Latitude => "latitude",
            Axis::Longitude => "longitude",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum Vec2TifError {
    #[error("Missing field: {axis} is not found! {columns:?}")]
    MissingField { axis: Axis, columns: Vec<String> },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{context}: {source}")]
    Raster {
        context: String,
        #[source]
        source: GdalError,
    },
}

/// エラーの大分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingField,
    InvalidInput,
    IoFailure,
}

impl Vec2TifError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Vec2TifError::InvalidInput(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Vec2TifError::MissingField { .. } => ErrorKind::MissingField,
            Vec2TifError::InvalidInput(_) => ErrorKind::InvalidInput,
            Vec2TifError::Csv(e) if !e.is_io_error() => ErrorKind::InvalidInput,
            Vec2TifError::Csv(_) | Vec2TifError::Io(_) | Vec2TifError::Raster { .. } => {
                ErrorKind::IoFailure
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Vec2TifError>;

/// GDALのエラーに文脈を付与する
pub trait RasterContext<T> {
    fn context<C: Into<String>>(self, context: C) -> Result<T>;
}

impl<T> RasterContext<T> for std::result::Result<T, GdalError> {
    fn context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|source| Vec2TifError::Raster {
            context: context.into(),
            source,
        })
    }
}
