use crate::error::{Axis, Result, Vec2TifError};

const LATITUDE_ALIASES: [&str; 2] = ["latitude", "lat"];
const LONGITUDE_ALIASES: [&str; 2] = ["longitude", "lng"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub index: usize,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatLonColumns {
    pub lat: ColumnRef,
    pub lng: ColumnRef,
}

impl LatLonColumns {
    pub fn is_coordinate(&self, index: usize) -> bool {
        index == self.lat.index || index == self.lng.index
    }
}

/// 列名から座標軸を判定する（大文字小文字は区別しない）
pub fn classify_column(name: &str) -> Option<Axis> {
    let lower = name.to_lowercase();
    if LATITUDE_ALIASES.contains(&lower.as_str()) {
        Some(Axis::Latitude)
    } else if LONGITUDE_ALIASES.contains(&lower.as_str()) {
        Some(Axis::Longitude)
    } else {
        None
    }
}

/// ヘッダーから緯度・経度列を探す。同じ軸に複数の列が該当する場合は左側の列を採用する
pub fn resolve_latlon_columns<S: AsRef<str>>(columns: &[S]) -> Result<LatLonColumns> {
    let mut lat = None;
    let mut lng = None;

    for (index, name) in columns.iter().enumerate() {
        let name = name.as_ref();
        let slot = match classify_column(name) {
            Some(Axis::Latitude) => &mut lat,
            Some(Axis::Longitude) => &mut lng,
            None => continue,
        };
        if slot.is_none() {
            *slot = Some(ColumnRef {
                index,
                name: name.to_string(),
            });
        }
    }

    let missing = |axis| Vec2TifError::MissingField {
        axis,
        columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
    };

    let lat = lat.ok_or_else(|| missing(Axis::Latitude))?;
    let lng = lng.ok_or_else(|| missing(Axis::Longitude))?;

    tracing::debug!(
        "Resolved coordinate columns: lat={:?}[{}], lng={:?}[{}]",
        lat.name,
        lat.index,
        lng.name,
        lng.index
    );

    Ok(LatLonColumns { lat, lng })
}
