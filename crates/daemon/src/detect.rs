//! Detection command construction.
//!
//! The external commercial detector is configured as a free-form command
//! template. The video path is appended as the sole trailing argument and
//! the tool's output streams are discarded; only the exit status is
//! consumed.

use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;

/// Error type for detection-command handling
#[derive(Debug, Error)]
pub enum DetectError {
    /// The configured template is empty or cannot be split into arguments
    #[error("Detect command template is empty or unparseable: {0:?}")]
    InvalidTemplate(String),
}

/// Splits the configured command template into an argv list.
///
/// Shell-style quoting in the template is honored, so paths with spaces and
/// quoted option values work as written in the config file.
pub fn split_template(template: &str) -> Result<Vec<String>, DetectError> {
    let argv = shlex::split(template).unwrap_or_default();
    if argv.is_empty() {
        return Err(DetectError::InvalidTemplate(template.to_string()));
    }
    Ok(argv)
}

/// Builds the detection command for one video file.
///
/// The template supplies the program and its fixed arguments; the video path
/// is appended last. stdin, stdout and stderr are all null devices.
pub fn build_detect_command(template: &str, video_path: &Path) -> Result<Command, DetectError> {
    let argv = split_template(template)?;

    let mut cmd = Command::new(&argv[0]);
    cmd.args(&argv[1..]);
    cmd.arg(video_path);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::null());
    cmd.stderr(Stdio::null());

    Ok(cmd)
}

/// Renders the command line as it would be run, for dry-run and debug logs.
pub fn render_detect_command(template: &str, video_path: &Path) -> String {
    let path = video_path.to_string_lossy();
    let quoted = shlex::try_quote(&path)
        .map(|q| q.into_owned())
        .unwrap_or_else(|_| path.into_owned());
    format!("{} {}", template, quoted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    /// Helper to convert Command args to a Vec of strings for easier testing
    fn get_command_args(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .filter_map(|arg| arg.to_str().map(String::from))
            .collect()
    }

    #[test]
    fn test_split_template_honors_quoting() {
        let argv = split_template(r#"comskip --ini="/etc/com skip.ini" --quiet"#).unwrap();
        assert_eq!(argv, vec!["comskip", "--ini=/etc/com skip.ini", "--quiet"]);
    }

    #[test]
    fn test_split_template_empty_is_error() {
        assert!(matches!(
            split_template(""),
            Err(DetectError::InvalidTemplate(_))
        ));
        assert!(matches!(
            split_template("   "),
            Err(DetectError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn test_build_command_appends_path_last() {
        let cmd = build_detect_command("comskip --quiet", Path::new("/media/show.mpg")).unwrap();

        assert_eq!(cmd.get_program(), "comskip");
        assert_eq!(get_command_args(&cmd), vec!["--quiet", "/media/show.mpg"]);
    }

    #[test]
    fn test_build_command_bare_program() {
        let cmd = build_detect_command("comskip", Path::new("/media/show.mpg")).unwrap();

        assert_eq!(cmd.get_program(), "comskip");
        assert_eq!(get_command_args(&cmd), vec!["/media/show.mpg"]);
    }

    #[test]
    fn test_render_quotes_paths_with_spaces() {
        let rendered = render_detect_command(
            "comskip --quiet",
            &PathBuf::from("/media/the show.mpg"),
        );

        assert_eq!(rendered, r#"comskip --quiet "/media/the show.mpg""#);
    }

    #[test]
    fn test_render_plain_path_unquoted() {
        let rendered = render_detect_command("comskip", &PathBuf::from("/media/show.mpg"));
        assert_eq!(rendered, "comskip /media/show.mpg");
    }
}
