//! Spawning the GUI helper from the auth dialog.

use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{Error, Result};

/// Suffix appended to the auth dialog's program name to find its helper.
pub const HELPER_SUFFIX: &str = "-gui";

/// Path of the GUI helper that belongs to `progname`.
pub fn helper_path(progname: &OsStr) -> PathBuf {
    let mut path = progname.to_os_string();
    path.push(HELPER_SUFFIX);
    PathBuf::from(path)
}

/// Run the helper, feed it `descriptor` on stdin and return what it printed.
///
/// Blocks until the helper exits. A helper that exits unsuccessfully is
/// reported as [`Error::HelperFailed`], separate from I/O failures.
pub fn run_gui_helper<I, S>(helper: &Path, args: I, descriptor: &str) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    debug!(helper = %helper.display(), "spawning GUI helper");

    let mut child = Command::new(helper)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|source| Error::Spawn {
            helper: helper.to_owned(),
            source,
        })?;

    // Dropping stdin closes the pipe so the helper sees end of input.
    if let Some(mut stdin) = child.stdin.take() {
        if let Err(source) = stdin.write_all(descriptor.as_bytes()) {
            drop(stdin);
            // A helper that died early says more than the broken pipe.
            return match child.wait() {
                Ok(status) if !status.success() => Err(Error::HelperFailed {
                    helper: helper.to_owned(),
                    status,
                }),
                _ => Err(Error::HelperWrite {
                    helper: helper.to_owned(),
                    source,
                }),
            };
        }
    }

    let output = child.wait_with_output().map_err(|source| Error::HelperWait {
        helper: helper.to_owned(),
        source,
    })?;

    if !output.status.success() {
        return Err(Error::HelperFailed {
            helper: helper.to_owned(),
            status: output.status,
        });
    }

    debug!(bytes = output.stdout.len(), "GUI helper finished");

    String::from_utf8(output.stdout).map_err(|_| Error::HelperOutput {
        helper: helper.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helper_path_appends_suffix() {
        assert_eq!(
            helper_path(OsStr::new("/usr/libexec/nm-novpn-auth-dialog")),
            PathBuf::from("/usr/libexec/nm-novpn-auth-dialog-gui")
        );
    }

    #[test]
    fn descriptor_reaches_helper_and_output_comes_back() {
        let output = run_gui_helper(Path::new("cat"), [""; 0], "[VPN Plugin UI]\nVersion=2\n").unwrap();
        assert_eq!(output, "[VPN Plugin UI]\nVersion=2\n");
    }

    #[test]
    fn arguments_are_passed_through() {
        let output = run_gui_helper(
            Path::new("sh"),
            ["-c", "cat >/dev/null; echo \"$0 $1\"", "--uuid=abc", "--name=Mock"],
            "",
        )
        .unwrap();
        assert_eq!(output, "--uuid=abc --name=Mock\n");
    }

    #[test]
    fn failing_helper_reports_status() {
        let err = run_gui_helper(Path::new("false"), [""; 0], "").unwrap_err();
        match err {
            Error::HelperFailed { helper, status } => {
                assert_eq!(helper, PathBuf::from("false"));
                assert_eq!(status.code(), Some(1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn helper_exiting_before_reading_reports_status() {
        // Larger than a pipe buffer, so the write cannot complete.
        let descriptor = "x".repeat(1 << 20);
        let err = run_gui_helper(Path::new("sh"), ["-c", "exit 2"], &descriptor).unwrap_err();
        match err {
            Error::HelperFailed { status, .. } => assert_eq!(status.code(), Some(2)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_helper_is_a_spawn_error() {
        let err = run_gui_helper(Path::new("/nonexistent/helper-gui"), [""; 0], "").unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
        assert!(err.to_string().starts_with("/nonexistent/helper-gui: "));
    }
}
