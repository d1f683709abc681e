//! Handles normalizing options and dispatching capture operations.

use std::{ffi::OsString, io::ErrorKind};

use serde::de::DeserializeOwned;

use crate::{
    options::{Coords, Region},
    runner::{ProcessRunner, Program, Runner},
    CaptureError, CaptureOptions, ImageFormat, RegionCapture, ScreenResolution, TakeResult,
    WindowCapture,
};

/// Takes screenshots through the capture executables.
///
/// Every operation blocks until the executable exits. Operations that are
/// passed no options behave as if passed [`CaptureOptions::default`].
#[derive(Debug, Clone)]
pub struct Screenshot<R = ProcessRunner> {
    /// Runs the executables.
    runner: R,
}

impl Screenshot<ProcessRunner> {
    /// Uses the executables in the `libs` directory next to the running executable.
    pub fn locate() -> Result<Self, CaptureError> {
        Ok(Self::new(ProcessRunner::locate()?))
    }
}

impl<R: Runner> Screenshot<R> {
    /// Takes screenshots through the given runner.
    pub fn new(runner: R) -> Self {
        Screenshot { runner }
    }

    /// Captures the whole screen.
    pub fn capture_full_screen(
        &self,
        options: Option<&CaptureOptions>,
    ) -> Result<RegionCapture, CaptureError> {
        self.format_only(Program::CaptureFullScreen, options)
    }

    /// Captures every window that has a main window title.
    pub fn capture_all_windows(
        &self,
        options: Option<&CaptureOptions>,
    ) -> Result<Vec<WindowCapture>, CaptureError> {
        let windows: Vec<WindowCapture> = self.format_only(Program::CaptureAllWindows, options)?;
        tracing::info!("captured {} windows", windows.len());
        Ok(windows)
    }

    /// Captures the taskbar.
    pub fn capture_taskbar(
        &self,
        options: Option<&CaptureOptions>,
    ) -> Result<RegionCapture, CaptureError> {
        self.format_only(Program::CaptureTaskbar, options)
    }

    /// Captures the screen without the taskbar.
    pub fn capture_working_area(
        &self,
        options: Option<&CaptureOptions>,
    ) -> Result<RegionCapture, CaptureError> {
        self.format_only(Program::CaptureWorkingArea, options)
    }

    /// Captures a rectangle of the screen.
    ///
    /// Missing coordinates default to `(0, 0, 100, 100)` one by one. Without
    /// any coordinates the whole screen is captured.
    pub fn capture_by_coordinates(
        &self,
        options: Option<&CaptureOptions>,
    ) -> Result<RegionCapture, CaptureError> {
        let defaults = CaptureOptions::default();
        let options = options.unwrap_or(&defaults);

        let region = self.region(options.coords)?;
        let args = region_args(region, options.image_format);
        let capture = self.run_json(Program::CaptureCoordinates, &args)?;
        tracing::info!(%region, "captured region");
        Ok(capture)
    }

    /// Queries the current screen resolution.
    pub fn screen_resolution(&self) -> Result<ScreenResolution, CaptureError> {
        self.run_json(Program::GetScreenResolution, &[])
    }

    /// Captures the whole screen, or a rectangle if coordinates are given,
    /// and optionally stores the image at the requested path.
    ///
    /// Negative coordinates are rejected before anything is run.
    pub fn take(&self, options: Option<&CaptureOptions>) -> Result<TakeResult, CaptureError> {
        let defaults = CaptureOptions::default();
        let options = options.unwrap_or(&defaults);

        if let Some(coords) = options.coords {
            coords.ensure_non_negative()?;
        }
        let region = self.region(options.coords)?;

        let program = Program::CaptureCoordinates;
        let scratch = tempfile::tempdir()?;
        let temp_path = scratch
            .path()
            .join(format!("capture.{}", options.image_format.extension()));

        let mut args = region_args(region, options.image_format);
        args.push(temp_path.clone().into_os_string());
        self.runner.run(program, &args)?;

        let buffer = match std::fs::read(&temp_path) {
            Ok(buffer) if !buffer.is_empty() => buffer,
            Ok(_) => return Err(CaptureError::MissingOutput { program }),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(CaptureError::MissingOutput { program })
            }
            Err(err) => return Err(err.into()),
        };
        std::fs::remove_file(&temp_path)?;
        scratch.close()?;

        let write_status = match &options.path {
            Some(path) => {
                std::fs::write(path, &buffer)?;
                tracing::info!(path = %path.display(), "stored {} byte image", buffer.len());
                path.exists()
            }
            None => false,
        };

        Ok(TakeResult {
            write_status,
            buffer,
        })
    }

    /// Runs an executable that only takes the image format.
    fn format_only<T: DeserializeOwned>(
        &self,
        program: Program,
        options: Option<&CaptureOptions>,
    ) -> Result<T, CaptureError> {
        let image_format = options.map(|options| options.image_format).unwrap_or_default();
        self.run_json(program, &[image_format.tag().into()])
    }

    /// Resolves the region to capture, querying the screen size if needed.
    fn region(&self, coords: Option<Coords>) -> Result<Region, CaptureError> {
        match coords {
            Some(coords) => Ok(coords.resolve()),
            None => {
                let ScreenResolution {
                    screen_width,
                    screen_height,
                } = self.screen_resolution()?;
                Ok(Region::screen(screen_width, screen_height))
            }
        }
    }

    /// Runs an executable and parses its stdout as JSON.
    fn run_json<T: DeserializeOwned>(
        &self,
        program: Program,
        args: &[OsString],
    ) -> Result<T, CaptureError> {
        let stdout = self.runner.run(program, args)?;
        parse_output(program, &stdout)
    }
}

/// The positional arguments describing a region.
fn region_args(Region { x1, y1, x2, y2 }: Region, image_format: ImageFormat) -> Vec<OsString> {
    vec![
        x1.to_string().into(),
        y1.to_string().into(),
        x2.to_string().into(),
        y2.to_string().into(),
        image_format.tag().into(),
    ]
}

/// Parses the JSON written by an executable.
fn parse_output<T: DeserializeOwned>(program: Program, stdout: &[u8]) -> Result<T, CaptureError> {
    // Window titles may come in the console code page rather than UTF-8.
    let stdout = String::from_utf8_lossy(stdout);
    // Console output on Windows may carry a byte order mark.
    let stdout = stdout.strip_prefix('\u{feff}').unwrap_or(&stdout);
    serde_json::from_str(stdout).map_err(|source| CaptureError::Parse { program, source })
}
