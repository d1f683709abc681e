//! The records reported by the capture executables.

mod serde_base64 {
    use base64::Engine;

    /// Serialize image bytes as base64.
    pub(super) fn serialize<S: serde::ser::Serializer>(
        bytes: &[u8],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    /// Deserialize base64 encoded image bytes.
    pub(super) fn deserialize<'de, D: serde::de::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<u8>, D::Error> {
        struct StrVisitor;

        impl<'de> serde::de::Visitor<'de> for StrVisitor {
            type Value = Vec<u8>;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a base64 encoded image")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                base64::engine::general_purpose::STANDARD
                    .decode(v.trim())
                    .map_err(|err| E::custom(err))
            }
        }

        deserializer.deserialize_str(StrVisitor)
    }
}

/// The current resolution of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenResolution {
    /// The width in pixels.
    pub screen_width: i64,
    /// The height in pixels.
    pub screen_height: i64,
}

/// A captured rectangle of the screen.
#[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionCapture {
    /// The left edge.
    pub top_left_x: i64,
    /// The top edge.
    pub top_left_y: i64,
    /// The right edge.
    pub bottom_right_x: i64,
    /// The bottom edge.
    pub bottom_right_y: i64,
    /// The encoded image.
    #[serde(with = "serde_base64")]
    pub image_buffer: Vec<u8>,
}

impl RegionCapture {
    /// Decodes the captured image.
    pub fn decode(&self) -> image::ImageResult<image::DynamicImage> {
        image::load_from_memory(&self.image_buffer)
    }
}

/// A captured window.
#[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowCapture {
    /// The id of the owning process.
    pub process_id: u32,
    /// The handle of the owning process.
    pub process_handle: u64,
    /// The name of the owning process.
    pub process_name: String,
    /// The title of the window.
    pub main_window_title: String,
    /// The handle of the window.
    pub main_window_handle: u64,
    /// The left edge.
    pub top_left_x: i64,
    /// The top edge.
    pub top_left_y: i64,
    /// The right edge.
    pub bottom_right_x: i64,
    /// The bottom edge.
    pub bottom_right_y: i64,
    /// The encoded image.
    #[serde(with = "serde_base64")]
    pub image_buffer: Vec<u8>,
}

impl WindowCapture {
    /// Decodes the captured image.
    pub fn decode(&self) -> image::ImageResult<image::DynamicImage> {
        image::load_from_memory(&self.image_buffer)
    }
}

// Image buffers are elided from debug output.
impl std::fmt::Debug for RegionCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionCapture")
            .field("top_left_x", &self.top_left_x)
            .field("top_left_y", &self.top_left_y)
            .field("bottom_right_x", &self.bottom_right_x)
            .field("bottom_right_y", &self.bottom_right_y)
            .field("image_buffer", &format_args!("<{} bytes>", self.image_buffer.len()))
            .finish()
    }
}

impl std::fmt::Debug for WindowCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowCapture")
            .field("process_id", &self.process_id)
            .field("process_handle", &self.process_handle)
            .field("process_name", &self.process_name)
            .field("main_window_title", &self.main_window_title)
            .field("main_window_handle", &self.main_window_handle)
            .field("top_left_x", &self.top_left_x)
            .field("top_left_y", &self.top_left_y)
            .field("bottom_right_x", &self.bottom_right_x)
            .field("bottom_right_y", &self.bottom_right_y)
            .field("image_buffer", &format_args!("<{} bytes>", self.image_buffer.len()))
            .finish()
    }
}

/// The outcome of `take`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TakeResult {
    /// Whether the image now exists at the requested path.
    ///
    /// Always false if no path was requested.
    pub write_status: bool,
    /// The encoded image.
    #[serde(with = "serde_base64")]
    pub buffer: Vec<u8>,
}
