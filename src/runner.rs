//! Handles running the capture executables.

use std::{
    ffi::{OsStr, OsString},
    fmt,
    path::{Path, PathBuf},
    process::Stdio,
};

use crate::CaptureError;

/// One of the bundled capture executables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Program {
    /// Captures the whole screen.
    CaptureFullScreen,
    /// Captures every window that has a main window title.
    CaptureAllWindows,
    /// Captures a rectangle given by its corners.
    CaptureCoordinates,
    /// Captures the taskbar.
    CaptureTaskbar,
    /// Captures the screen without the taskbar.
    CaptureWorkingArea,
    /// Reports the current screen resolution.
    GetScreenResolution,
}

impl Program {
    /// The file name of the executable.
    pub fn file_name(self) -> &'static str {
        match self {
            Program::CaptureFullScreen => "capture_fullscreen.exe",
            Program::CaptureAllWindows => "capture_all_windows.exe",
            Program::CaptureCoordinates => "capture_coordinates.exe",
            Program::CaptureTaskbar => "capture_taskbar.exe",
            Program::CaptureWorkingArea => "capture_working_area.exe",
            Program::GetScreenResolution => "get_screen_resolution.exe",
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Runs a capture executable to completion.
pub trait Runner {
    /// Runs `program` with the given positional arguments, blocking until it
    /// exits, and returns its stdout.
    fn run(&self, program: Program, args: &[OsString]) -> Result<Vec<u8>, CaptureError>;
}

impl<R: Runner + ?Sized> Runner for &R {
    fn run(&self, program: Program, args: &[OsString]) -> Result<Vec<u8>, CaptureError> {
        (**self).run(program, args)
    }
}

/// How the executables are started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launcher {
    /// Through the command interpreter (`cmd.exe /c`).
    Shell,
    /// By executing the file itself.
    Direct,
}

impl Default for Launcher {
    fn default() -> Self {
        if cfg!(windows) {
            Launcher::Shell
        } else {
            Launcher::Direct
        }
    }
}

/// Runs the executables as child processes.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    /// The directory containing the executables.
    libs_dir: PathBuf,
    /// How the executables are started.
    launcher: Launcher,
}

impl ProcessRunner {
    /// Creates a runner for the executables in `libs_dir`.
    pub fn new(libs_dir: impl Into<PathBuf>, launcher: Launcher) -> Self {
        ProcessRunner {
            libs_dir: libs_dir.into(),
            launcher,
        }
    }

    /// Creates a runner for the `libs` directory next to the running executable.
    pub fn locate() -> Result<Self, CaptureError> {
        Ok(Self::new(Self::default_libs_dir()?, Launcher::default()))
    }

    /// The `libs` directory next to the running executable.
    pub fn default_libs_dir() -> Result<PathBuf, CaptureError> {
        let exe = std::env::current_exe()?;
        let dir = exe.parent().unwrap_or_else(|| Path::new("."));
        Ok(dir.join("libs"))
    }

    /// The directory containing the executables.
    pub fn libs_dir(&self) -> &Path {
        &self.libs_dir
    }

    /// Builds the command for running `program`.
    fn command(&self, program: Program, args: &[OsString]) -> std::process::Command {
        let path = self.libs_dir.join(program.file_name());
        let mut command = match self.launcher {
            Launcher::Shell => {
                let mut command = std::process::Command::new("cmd.exe");
                command.arg("/c");
                push_raw(&mut command, shell_line(&path, args));
                command
            }
            Launcher::Direct => {
                let mut command = std::process::Command::new(path);
                command.args(args);
                command
            }
        };
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }
}

/// Builds the line run by `cmd /c`.
///
/// cmd strips the first and the last quote of the line, so the whole line
/// is wrapped in one more pair of quotes: `""<exe>" <args>"`.
fn shell_line(path: &Path, args: &[OsString]) -> OsString {
    let mut line = OsString::from("\"");
    push_quoted(&mut line, path.as_os_str(), true);
    for arg in args {
        line.push(" ");
        push_quoted(&mut line, arg, false);
    }
    line.push("\"");
    line
}

/// Appends `arg`, quoted if asked to or if it contains spaces.
fn push_quoted(line: &mut OsString, arg: &OsStr, always: bool) {
    let needs_quotes = always
        || arg.is_empty()
        || arg
            .to_string_lossy()
            .chars()
            .any(|c| c.is_whitespace());
    if needs_quotes {
        line.push("\"");
        line.push(arg);
        line.push("\"");
    } else {
        line.push(arg);
    }
}

/// Passes `line` to the command interpreter without any further quoting.
#[cfg(windows)]
fn push_raw(command: &mut std::process::Command, line: OsString) {
    use std::os::windows::process::CommandExt as _;
    command.raw_arg(line);
}

#[cfg(not(windows))]
fn push_raw(command: &mut std::process::Command, line: OsString) {
    command.arg(line);
}

impl Runner for ProcessRunner {
    fn run(&self, program: Program, args: &[OsString]) -> Result<Vec<u8>, CaptureError> {
        let mut command = self.command(program, args);
        tracing::debug!(?command, "running {program}");

        let output = command
            .output()
            .map_err(|source| CaptureError::Spawn { program, source })?;

        if !output.status.success() {
            return Err(CaptureError::ProcessFailed {
                program,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt as _;

    use super::*;

    /// Installs a shell script posing as `program` into `dir`.
    #[cfg(unix)]
    fn install(dir: &Path, program: Program, script: &str) {
        let path = dir.join(program.file_name());
        std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn returns_stdout_and_passes_arguments() {
        let dir = tempfile::tempdir().unwrap();
        install(dir.path(), Program::CaptureFullScreen, r#"echo "$@""#);

        let runner = ProcessRunner::new(dir.path(), Launcher::Direct);
        let stdout = runner
            .run(Program::CaptureFullScreen, &["JPEG".into()])
            .unwrap();

        assert_eq!(stdout, b"JPEG\n");
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_a_process_failure() {
        let dir = tempfile::tempdir().unwrap();
        install(
            dir.path(),
            Program::CaptureTaskbar,
            "echo '{}'\necho 'taskbar not found' >&2\nexit 1",
        );

        let runner = ProcessRunner::new(dir.path(), Launcher::Direct);
        let err = runner.run(Program::CaptureTaskbar, &[]).unwrap_err();

        match err {
            CaptureError::ProcessFailed {
                program,
                code,
                stderr,
            } => {
                assert_eq!(program, Program::CaptureTaskbar);
                assert_eq!(code, Some(1));
                assert_eq!(stderr, "taskbar not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn missing_executable_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new(dir.path(), Launcher::Direct);

        assert!(matches!(
            runner.run(Program::GetScreenResolution, &[]),
            Err(CaptureError::Spawn {
                program: Program::GetScreenResolution,
                ..
            })
        ));
    }

    #[test]
    fn shell_line_wraps_paths_with_spaces() {
        let exe = Path::new(r"C:\Program Files\shot\libs\capture_coordinates.exe");
        let args: Vec<OsString> = ["0", "0", "100", "100", "PNG"]
            .into_iter()
            .map(OsString::from)
            .chain([OsString::from(
                r"C:\Users\Jane Doe\AppData\Local\Temp\.tmp1\capture.png",
            )])
            .collect();

        assert_eq!(
            shell_line(exe, &args),
            OsString::from(
                r#"""C:\Program Files\shot\libs\capture_coordinates.exe" 0 0 100 100 PNG "C:\Users\Jane Doe\AppData\Local\Temp\.tmp1\capture.png"""#
            )
        );
        assert_eq!(
            shell_line(Path::new(r"C:\libs\capture_taskbar.exe"), &["GIF".into()]),
            OsString::from(r#"""C:\libs\capture_taskbar.exe" GIF""#)
        );
    }

    #[test]
    fn shell_launcher_passes_one_wrapped_line_to_cmd() {
        let runner = ProcessRunner::new("libs dir", Launcher::Shell);
        let command = runner.command(Program::CaptureCoordinates, &["0".into(), "PNG".into()]);

        let exe = Path::new("libs dir").join("capture_coordinates.exe");
        let expected = format!("\"\"{}\" 0 PNG\"", exe.display());

        assert_eq!(command.get_program(), "cmd.exe");
        let args: Vec<_> = command.get_args().collect();
        assert_eq!(args, [OsStr::new("/c"), OsStr::new(&expected)]);
    }

    #[test]
    fn direct_launcher_passes_arguments_separately() {
        let runner = ProcessRunner::new("libs", Launcher::Direct);
        let command = runner.command(Program::CaptureFullScreen, &["BMP".into()]);

        assert_eq!(
            command.get_program(),
            Path::new("libs").join("capture_fullscreen.exe").as_os_str()
        );
        assert_eq!(command.get_args().collect::<Vec<_>>(), [OsStr::new("BMP")]);
    }

    #[test]
    fn default_libs_dir_is_next_to_the_executable() {
        let runner = ProcessRunner::locate().unwrap();

        assert!(runner.libs_dir().ends_with("libs"));
        assert_eq!(
            runner.libs_dir().parent(),
            std::env::current_exe().unwrap().parent()
        );
    }
}
