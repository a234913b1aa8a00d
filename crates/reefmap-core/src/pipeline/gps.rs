//! GPS coordinate derivation from EXIF degree/minute/second tuples.
//!
//! The stages run in a fixed order: DMS to decimal, hemisphere sign, then
//! the validation gate. A pair is accepted or dropped as a unit.

use exif::{Exif, In, Tag, Value};
use serde::{Deserialize, Serialize};

use super::rational::dms_triple;

/// A validated latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Raw GPS tags pulled out of the EXIF GPS sub-block.
///
/// Coordinate tuples are already reduced to floats; a `None` tuple means the
/// tag is missing or not a three-component rational.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpsFields {
    pub latitude: Option<[f64; 3]>,
    pub latitude_ref: Option<String>,
    pub longitude: Option<[f64; 3]>,
    pub longitude_ref: Option<String>,
}

/// Why a decoded pair was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// NaN or infinity at some stage of the conversion
    NonFinite,
    /// Exactly (0, 0), the conventional "no fix" value
    NullIsland,
    /// Latitude outside [-90, 90] or longitude outside [-180, 180]
    OutOfRange,
}

/// Result of GPS derivation for one image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GpsOutcome {
    /// Both components converted and passed validation
    Accepted(Coordinates),
    /// No GPS sub-block in the image
    Absent,
    /// GPS block present but a coordinate tuple is missing or malformed
    Malformed,
    /// Coordinates decoded but failed validation
    Rejected(Rejection),
}

impl GpsOutcome {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            GpsOutcome::Accepted(c) => Some(*c),
            _ => None,
        }
    }
}

/// Convert degrees/minutes/seconds to decimal degrees.
///
/// Returns `None` if any component or the result is NaN or infinite.
pub fn dms_to_decimal(dms: [f64; 3]) -> Option<f64> {
    if dms.iter().any(|c| !c.is_finite()) {
        return None;
    }
    let [degrees, minutes, seconds] = dms;
    let decimal = degrees + minutes / 60.0 + seconds / 3600.0;
    decimal.is_finite().then_some(decimal)
}

/// Sign a converted coordinate from its hemisphere reference.
///
/// The sign comes from the reference alone: `negative_ref` ("S" or "W")
/// yields a negative value, anything else a positive one. The sign of the
/// raw value never contributes, so a pre-negated input is not flipped back.
pub fn apply_hemisphere(value: f64, reference: Option<&str>, negative_ref: &str) -> f64 {
    if reference == Some(negative_ref) {
        -value.abs()
    } else {
        value.abs()
    }
}

/// The validation gate shared by extraction and manual tagging.
pub fn validate_pair(latitude: f64, longitude: f64) -> Result<Coordinates, Rejection> {
    if !latitude.is_finite() || !longitude.is_finite() {
        return Err(Rejection::NonFinite);
    }
    if latitude == 0.0 && longitude == 0.0 {
        return Err(Rejection::NullIsland);
    }
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(Rejection::OutOfRange);
    }
    Ok(Coordinates {
        latitude,
        longitude,
    })
}

/// Run the full derivation over a set of raw GPS tags.
pub fn resolve(fields: &GpsFields) -> GpsOutcome {
    let (Some(lat_dms), Some(lon_dms)) = (fields.latitude, fields.longitude) else {
        return GpsOutcome::Malformed;
    };
    let (Some(latitude), Some(longitude)) = (dms_to_decimal(lat_dms), dms_to_decimal(lon_dms))
    else {
        return GpsOutcome::Rejected(Rejection::NonFinite);
    };

    let latitude = apply_hemisphere(latitude, fields.latitude_ref.as_deref(), "S");
    let longitude = apply_hemisphere(longitude, fields.longitude_ref.as_deref(), "W");

    match validate_pair(latitude, longitude) {
        Ok(coordinates) => GpsOutcome::Accepted(coordinates),
        Err(rejection) => GpsOutcome::Rejected(rejection),
    }
}

/// Pull the GPS tags out of a parsed EXIF block.
///
/// Returns `None` when the image has no GPS sub-block at all.
pub fn read_gps_fields(exif: &Exif) -> Option<GpsFields> {
    let has_gps_block = exif
        .fields()
        .any(|f| f.tag.context() == exif::Context::Gps);
    if !has_gps_block {
        return None;
    }

    let triple = |tag: Tag| {
        exif.get_field(tag, In::PRIMARY)
            .and_then(|f| dms_triple(&f.value))
            .map(|parts| parts.map(|r| r.to_f64_or_zero()))
    };
    let reference = |tag: Tag| {
        exif.get_field(tag, In::PRIMARY)
            .and_then(|f| ascii_value(&f.value))
            .map(|s| s.trim().to_string())
    };

    Some(GpsFields {
        latitude: triple(Tag::GPSLatitude),
        latitude_ref: reference(Tag::GPSLatitudeRef),
        longitude: triple(Tag::GPSLongitude),
        longitude_ref: reference(Tag::GPSLongitudeRef),
    })
}

/// First string of an ASCII value, minus any trailing NUL terminator.
///
/// Padding spaces are part of the value and are kept.
pub(crate) fn ascii_value(value: &Value) -> Option<String> {
    match value {
        Value::Ascii(strings) => strings.first().map(|bytes| {
            String::from_utf8_lossy(bytes)
                .trim_end_matches('\0')
                .to_string()
        }),
        _ => None,
    }
}
