//! Windows screenshots through a set of bundled capture executables.
//!
//! The executables do the capturing and encoding. This crate resolves the
//! options, runs the right executable, and parses what it reports:
//!
//! ```no_run
//! use win_screenshot::{CaptureOptions, ImageFormat, Screenshot};
//!
//! let screenshot = Screenshot::locate()?;
//! let options = CaptureOptions::default()
//!     .with_format(ImageFormat::Jpeg)
//!     .with_path("desktop.jpg");
//! let result = screenshot.take(Some(&options))?;
//! assert!(result.write_status);
//! # Ok::<(), win_screenshot::CaptureError>(())
//! ```

mod dispatcher;
mod error;
mod format;
mod options;
mod records;
pub mod runner;

pub use dispatcher::Screenshot;
pub use error::CaptureError;
pub use format::{ImageFormat, UnknownFormat};
pub use options::{CaptureOptions, Coords, Region};
pub use records::{RegionCapture, ScreenResolution, TakeResult, WindowCapture};
