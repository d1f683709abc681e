//! Handles the options accepted by capture operations.

use std::{fmt, path::PathBuf};

use serde_json::{Map, Value};

use crate::{CaptureError, ImageFormat};

/// A rectangle on the screen given by two corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Region {
    /// The left edge.
    pub x1: i64,
    /// The top edge.
    pub y1: i64,
    /// The right edge.
    pub x2: i64,
    /// The bottom edge.
    pub y2: i64,
}

impl Region {
    /// The whole screen of the given size.
    pub fn screen(width: i64, height: i64) -> Self {
        Region {
            x1: 0,
            y1: 0,
            x2: width,
            y2: height,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Region { x1, y1, x2, y2 } = self;
        write!(f, "{{ x1: {x1}, y1: {y1}, x2: {x2}, y2: {y2} }}")
    }
}

/// Coordinates as supplied by a caller, any of which may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Coords {
    /// The left edge, 0 if missing.
    pub x1: Option<i64>,
    /// The top edge, 0 if missing.
    pub y1: Option<i64>,
    /// The right edge, 100 if missing.
    pub x2: Option<i64>,
    /// The bottom edge, 100 if missing.
    pub y2: Option<i64>,
}

impl Coords {
    /// Fills in every missing coordinate on its own.
    pub fn resolve(self) -> Region {
        Region {
            x1: self.x1.unwrap_or(0),
            y1: self.y1.unwrap_or(0),
            x2: self.x2.unwrap_or(100),
            y2: self.y2.unwrap_or(100),
        }
    }

    /// Returns the supplied coordinates along with their names.
    fn supplied(self) -> impl Iterator<Item = (&'static str, i64)> {
        [
            ("x1", self.x1),
            ("y1", self.y1),
            ("x2", self.x2),
            ("y2", self.y2),
        ]
        .into_iter()
        .filter_map(|(name, value)| Some((name, value?)))
    }

    /// Fails on the first supplied coordinate that is negative.
    pub fn ensure_non_negative(self) -> Result<(), CaptureError> {
        match self.supplied().find(|&(_, value)| value < 0) {
            Some((field, value)) => Err(CaptureError::NegativeCoordinate { field, value }),
            None => Ok(()),
        }
    }
}

impl From<Region> for Coords {
    fn from(Region { x1, y1, x2, y2 }: Region) -> Self {
        Coords {
            x1: Some(x1),
            y1: Some(y1),
            x2: Some(x2),
            y2: Some(y2),
        }
    }
}

/// The options of a capture operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureOptions {
    /// The format of the captured image.
    pub image_format: ImageFormat,
    /// The region to capture, for operations that take one.
    ///
    /// Operations capture the whole screen if this is missing.
    pub coords: Option<Coords>,
    /// Where `take` should store the image.
    pub path: Option<PathBuf>,
}

impl CaptureOptions {
    /// Sets the image format.
    pub fn with_format(mut self, image_format: ImageFormat) -> Self {
        self.image_format = image_format;
        self
    }

    /// Sets the coordinates.
    pub fn with_coords(mut self, coords: impl Into<Coords>) -> Self {
        self.coords = Some(coords.into());
        self
    }

    /// Sets the destination of `take`.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Parses a loosely typed options document such as
    /// `{"imageFormat": "JPEG", "coords": {"x1": 10}, "path": "out.jpg"}`.
    ///
    /// `null` gives the defaults. Unknown image formats become PNG and
    /// unknown keys are ignored.
    pub fn from_value(value: &Value) -> Result<Self, CaptureError> {
        let object = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(object) => object,
            other => {
                return Err(CaptureError::InvalidOptions(format!(
                    "expected an object, found {other}"
                )))
            }
        };

        let image_format = ImageFormat::resolve(object.get("imageFormat").and_then(Value::as_str));

        let coords = match object.get("coords") {
            None | Some(Value::Null) => None,
            Some(Value::Object(coords)) => Some(Coords {
                x1: coordinate(coords, "x1")?,
                y1: coordinate(coords, "y1")?,
                x2: coordinate(coords, "x2")?,
                y2: coordinate(coords, "y2")?,
            }),
            Some(other) => {
                return Err(CaptureError::InvalidOptions(format!(
                    "coords must be an object, found {other}"
                )))
            }
        };

        let path = match object.get("path") {
            None | Some(Value::Null) => None,
            Some(Value::String(path)) => Some(PathBuf::from(path)),
            Some(other) => {
                return Err(CaptureError::InvalidOptions(format!(
                    "path must be a string, found {other}"
                )))
            }
        };

        Ok(CaptureOptions {
            image_format,
            coords,
            path,
        })
    }
}

/// Reads one integer coordinate from a coords object.
fn coordinate(coords: &Map<String, Value>, name: &str) -> Result<Option<i64>, CaptureError> {
    match coords.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|value| value.fract() == 0.0 && value.abs() < i64::MAX as f64)
                    .map(|value| value as i64)
            })
            .map(Some)
            .ok_or_else(|| {
                CaptureError::InvalidOptions(format!(
                    "coordinate {name} must be an integer, found {number}"
                ))
            }),
        Some(other) => Err(CaptureError::InvalidOptions(format!(
            "coordinate {name} must be a number, found {other}"
        ))),
    }
}
