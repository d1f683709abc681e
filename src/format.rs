//! Handles the image formats understood by the capture executables.

use std::{fmt, str::FromStr};

/// An output format of the capture executables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// Portable network graphics.
    #[default]
    Png,
    /// JPEG.
    Jpeg,
    /// Tagged image file format.
    Tiff,
    /// Graphics interchange format.
    Gif,
    /// Windows bitmap.
    Bmp,
}

impl ImageFormat {
    /// All formats, in the order the executables document them.
    pub const ALL: [ImageFormat; 5] = [
        ImageFormat::Png,
        ImageFormat::Jpeg,
        ImageFormat::Tiff,
        ImageFormat::Gif,
        ImageFormat::Bmp,
    ];

    /// The tag passed on the command line.
    pub fn tag(self) -> &'static str {
        match self {
            ImageFormat::Png => "PNG",
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Tiff => "TIFF",
            ImageFormat::Gif => "GIF",
            ImageFormat::Bmp => "BMP",
        }
    }

    /// The usual file extension.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
        }
    }

    /// Resolves a caller supplied tag.
    ///
    /// Only the exact tags are recognized. Anything else, including no tag
    /// at all, resolves to PNG.
    pub fn resolve(tag: Option<&str>) -> Self {
        tag.and_then(|tag| Self::ALL.into_iter().find(|format| format.tag() == tag))
            .unwrap_or_default()
    }

    /// The matching format of the `image` crate.
    pub(crate) fn to_image_format(self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Tiff => image::ImageFormat::Tiff,
            ImageFormat::Gif => image::ImageFormat::Gif,
            ImageFormat::Bmp => image::ImageFormat::Bmp,
        }
    }

    /// Whether the given encoded bytes look like an image of this format.
    pub fn matches(self, bytes: &[u8]) -> bool {
        image::guess_format(bytes).map_or(false, |guessed| guessed == self.to_image_format())
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A format name that is not one of the known tags.
#[derive(Debug, thiserror::Error)]
#[error("unknown image format `{0}` (expected one of PNG, JPEG, TIFF, GIF, BMP)")]
pub struct UnknownFormat(pub String);

/// Strict, case-insensitive parsing for user facing input.
impl FromStr for ImageFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        match upper.as_str() {
            "JPG" => Ok(ImageFormat::Jpeg),
            "TIF" => Ok(ImageFormat::Tiff),
            _ => Self::ALL
                .into_iter()
                .find(|format| format.tag() == upper)
                .ok_or_else(|| UnknownFormat(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tags_resolve_to_themselves() {
        for format in ImageFormat::ALL {
            assert_eq!(ImageFormat::resolve(Some(format.tag())), format);
        }
    }

    #[test]
    fn unknown_or_missing_tags_resolve_to_png() {
        assert_eq!(ImageFormat::resolve(None), ImageFormat::Png);
        assert_eq!(ImageFormat::resolve(Some("WEBP")), ImageFormat::Png);
        assert_eq!(ImageFormat::resolve(Some("jpeg")), ImageFormat::Png);
        assert_eq!(ImageFormat::resolve(Some("")), ImageFormat::Png);
    }

    #[test]
    fn parsing_is_case_insensitive_but_strict() {
        assert_eq!("jpeg".parse::<ImageFormat>().unwrap(), ImageFormat::Jpeg);
        assert_eq!("Jpg".parse::<ImageFormat>().unwrap(), ImageFormat::Jpeg);
        assert_eq!("bmp".parse::<ImageFormat>().unwrap(), ImageFormat::Bmp);
        assert!("webp".parse::<ImageFormat>().is_err());
    }

    #[test]
    fn recognizes_png_signature() {
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        assert!(ImageFormat::Png.matches(png));
        assert!(!ImageFormat::Jpeg.matches(png));
        assert!(!ImageFormat::Png.matches(b"not an image"));
    }
}
