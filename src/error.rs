//! Errors of capture operations.

use crate::runner::Program;

/// Why a capture operation failed.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The options bag could not be understood.
    #[error("invalid capture options: {0}")]
    InvalidOptions(String),

    /// A supplied coordinate was negative.
    #[error("coordinate {field} must not be negative, got {value}")]
    NegativeCoordinate {
        /// The name of the coordinate (`x1`, `y1`, `x2` or `y2`).
        field: &'static str,
        /// The rejected value.
        value: i64,
    },

    /// The executable could not be started at all.
    #[error("failed to launch {program}")]
    Spawn {
        /// The executable that failed to launch.
        program: Program,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The executable ran but reported failure.
    #[error("{program} {}{}", describe_exit(*.code), describe_stderr(.stderr))]
    ProcessFailed {
        /// The executable that failed.
        program: Program,
        /// The exit code, if the process exited normally.
        code: Option<i32>,
        /// What the process wrote to stderr.
        stderr: String,
    },

    /// The executable's output was not the expected JSON.
    #[error("unexpected output from {program}")]
    Parse {
        /// The executable whose output was rejected.
        program: Program,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The executable succeeded but did not write the requested file.
    #[error("{program} did not write an image")]
    MissingOutput {
        /// The executable that should have written the file.
        program: Program,
    },

    /// Reading or writing an image file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with code {code}"),
        None => "was terminated by a signal".to_owned(),
    }
}

fn describe_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_failure_message() {
        let err = CaptureError::ProcessFailed {
            program: Program::CaptureTaskbar,
            code: Some(1),
            stderr: "no taskbar".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "capture_taskbar.exe exited with code 1: no taskbar"
        );

        let err = CaptureError::ProcessFailed {
            program: Program::CaptureFullScreen,
            code: None,
            stderr: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "capture_fullscreen.exe was terminated by a signal"
        );
    }
}
