use std::path::{Path, PathBuf};

use anyhow::Context as _;
use image::GenericImageView as _;
use structopt::StructOpt;
use win_screenshot::{
    runner::{Launcher, ProcessRunner},
    CaptureError, CaptureOptions, Coords, ImageFormat, RegionCapture, Screenshot, WindowCapture,
};

/// Options shared by the capture commands.
#[derive(Debug, StructOpt)]
struct OptionArgs {
    /// a JSON file with capture options, overridden by the other flags
    #[structopt(long, parse(from_os_str))]
    options: Option<PathBuf>,
    /// the image format: png, jpeg, tiff, gif or bmp
    #[structopt(long, short)]
    format: Option<ImageFormat>,
}

/// The corners of the region to capture.
#[derive(Debug, StructOpt)]
struct CoordArgs {
    /// the left edge [default: 0]
    #[structopt(long, allow_hyphen_values = true)]
    x1: Option<i64>,
    /// the top edge [default: 0]
    #[structopt(long, allow_hyphen_values = true)]
    y1: Option<i64>,
    /// the right edge [default: 100]
    #[structopt(long, allow_hyphen_values = true)]
    x2: Option<i64>,
    /// the bottom edge [default: 100]
    #[structopt(long, allow_hyphen_values = true)]
    y2: Option<i64>,
}

impl OptionArgs {
    /// Builds the capture options, starting from the options file if there is one.
    fn resolve(self, coords: Option<CoordArgs>) -> anyhow::Result<CaptureOptions> {
        let mut options = match &self.options {
            Some(path) => {
                let bag: serde_json::Value = serde_json::from_reader(
                    std::fs::File::open(path)
                        .with_context(|| format!("cannot open {}", path.display()))?,
                )
                .with_context(|| format!("{} is not valid JSON", path.display()))?;
                CaptureOptions::from_value(&bag)?
            }
            None => CaptureOptions::default(),
        };

        if let Some(format) = self.format {
            options.image_format = format;
        }

        if let Some(CoordArgs { x1, y1, x2, y2 }) = coords {
            if [x1, y1, x2, y2].iter().any(Option::is_some) {
                let base = options.coords.unwrap_or_default();
                options.coords = Some(Coords {
                    x1: x1.or(base.x1),
                    y1: y1.or(base.y1),
                    x2: x2.or(base.x2),
                    y2: y2.or(base.y2),
                });
            }
        }

        tracing::debug!(?options, "resolved capture options");
        Ok(options)
    }
}

/// Windows screenshots through the bundled capture executables
#[derive(Debug, StructOpt)]
struct Config {
    /// the directory containing the capture executables [default: libs next to this program]
    #[structopt(long, env = "WIN_SCREENSHOT_LIBS", parse(from_os_str))]
    libs_dir: Option<PathBuf>,
    /// run the executables directly instead of through cmd.exe
    #[structopt(long)]
    direct: bool,
    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// captures the whole screen
    FullScreen {
        #[structopt(flatten)]
        options: OptionArgs,
        /// the file where the image should be stored
        #[structopt(long, short, parse(from_os_str))]
        output: Option<PathBuf>,
    },
    /// captures every window with a main window title
    AllWindows {
        #[structopt(flatten)]
        options: OptionArgs,
        /// the directory where one image per window should be stored
        #[structopt(long, parse(from_os_str))]
        output_dir: Option<PathBuf>,
    },
    /// captures a rectangle of the screen
    Coordinates {
        #[structopt(flatten)]
        options: OptionArgs,
        #[structopt(flatten)]
        coords: CoordArgs,
        /// the file where the image should be stored
        #[structopt(long, short, parse(from_os_str))]
        output: Option<PathBuf>,
    },
    /// captures the taskbar
    Taskbar {
        #[structopt(flatten)]
        options: OptionArgs,
        /// the file where the image should be stored
        #[structopt(long, short, parse(from_os_str))]
        output: Option<PathBuf>,
    },
    /// captures the screen without the taskbar
    WorkingArea {
        #[structopt(flatten)]
        options: OptionArgs,
        /// the file where the image should be stored
        #[structopt(long, short, parse(from_os_str))]
        output: Option<PathBuf>,
    },
    /// captures the screen or a rectangle of it and stores the image
    Take {
        #[structopt(flatten)]
        options: OptionArgs,
        #[structopt(flatten)]
        coords: CoordArgs,
        /// the file where the image should be stored
        #[structopt(long, parse(from_os_str))]
        path: Option<PathBuf>,
    },
    /// prints the current screen resolution
    Resolution,
}

/// Stores the image of a region capture, checking that it decodes.
fn store_region(
    capture: &RegionCapture,
    format: ImageFormat,
    output: &Path,
) -> anyhow::Result<()> {
    if !format.matches(&capture.image_buffer) {
        tracing::warn!("captured image does not look like {format}");
    }
    let image = capture
        .decode()
        .context("the captured image cannot be decoded")?;
    std::fs::write(output, &capture.image_buffer)
        .with_context(|| format!("cannot write {}", output.display()))?;
    tracing::info!(
        path = %output.display(),
        "stored {}x{} image",
        image.width(),
        image.height()
    );
    Ok(())
}

/// Runs a capture that yields one region, storing and printing it.
fn region_command(
    options: OptionArgs,
    coords: Option<CoordArgs>,
    output: Option<PathBuf>,
    capture: impl FnOnce(&CaptureOptions) -> Result<RegionCapture, CaptureError>,
) -> anyhow::Result<()> {
    let options = options.resolve(coords)?;
    let capture = capture(&options)?;
    if let Some(output) = output {
        store_region(&capture, options.image_format, &output)?;
    }
    print(&capture)
}

/// Stores one image per captured window.
fn store_windows(
    windows: &[WindowCapture],
    format: ImageFormat,
    output_dir: &Path,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(output_dir)?;
    for window in windows {
        let mut path = output_dir.to_path_buf();
        path.push(format!("{}.{}", window.process_id, format.extension()));
        std::fs::write(&path, &window.image_buffer)
            .with_context(|| format!("cannot write {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            "stored window {:?} of {}",
            window.main_window_title,
            window.process_name
        );
    }
    Ok(())
}

/// Prints a result as pretty JSON.
fn print(value: &impl serde::Serialize) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    println!();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "win_screenshot=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_args();

    let libs_dir = match config.libs_dir {
        Some(libs_dir) => libs_dir,
        None => ProcessRunner::default_libs_dir()?,
    };
    let launcher = if config.direct {
        Launcher::Direct
    } else {
        Launcher::default()
    };
    tracing::debug!(libs_dir = %libs_dir.display(), ?launcher, "using capture executables");
    let screenshot = Screenshot::new(ProcessRunner::new(libs_dir, launcher));

    match config.command {
        Command::FullScreen { options, output } => {
            region_command(options, None, output, |options| {
                screenshot.capture_full_screen(Some(options))
            })?;
        }
        Command::AllWindows {
            options,
            output_dir,
        } => {
            let options = options.resolve(None)?;
            let windows = screenshot.capture_all_windows(Some(&options))?;
            if let Some(output_dir) = output_dir {
                store_windows(&windows, options.image_format, &output_dir)?;
            }
            print(&windows)?;
        }
        Command::Coordinates {
            options,
            coords,
            output,
        } => {
            region_command(options, Some(coords), output, |options| {
                screenshot.capture_by_coordinates(Some(options))
            })?;
        }
        Command::Taskbar { options, output } => {
            region_command(options, None, output, |options| {
                screenshot.capture_taskbar(Some(options))
            })?;
        }
        Command::WorkingArea { options, output } => {
            region_command(options, None, output, |options| {
                screenshot.capture_working_area(Some(options))
            })?;
        }
        Command::Take {
            options,
            coords,
            path,
        } => {
            let mut options = options.resolve(Some(coords))?;
            if path.is_some() {
                options.path = path;
            }
            let result = screenshot.take(Some(&options))?;
            if let Some(path) = &options.path {
                if !result.write_status {
                    anyhow::bail!("the image was not stored at {}", path.display());
                }
            }
            print(&result)?;
        }
        Command::Resolution => {
            print(&screenshot.screen_resolution()?)?;
        }
    }

    Ok(())
}
