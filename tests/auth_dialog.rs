//! End-to-end runs of the auth dialog and its helper binaries. None of these
//! reach the prompt UI: either external UI mode is used or nothing needs to
//! be asked.

use std::io::Write;
use std::process::{Command, Output, Stdio};

const AUTH_DIALOG: &str = env!("CARGO_BIN_EXE_nm-novpn-auth-dialog");
const AUTH_DIALOG_GUI: &str = env!("CARGO_BIN_EXE_nm-novpn-auth-dialog-gui");

const CONNECTION_ARGS: [&str; 3] = [
    "--uuid=7d3a1b4e-0000-4000-8000-000000000001",
    "--name=Mock VPN",
    "--service=org.freedesktop.NetworkManager.Novpn",
];

fn run(program: &str, args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    // The program may exit before reading its input.
    let _ = child.stdin.take().unwrap().write_all(stdin.as_bytes());
    child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn missing_connection_arguments_fail() {
    let output = run(AUTH_DIALOG, &["--name=Mock VPN"], "DONE\n");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("A connection UUID, name, and VPN plugin service name are required."));
}

#[test]
fn unknown_option_fails() {
    let output = run(AUTH_DIALOG, &["--bogus"], "DONE\n");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Bad command line options"));
}

#[test]
fn truncated_details_fail() {
    let output = run(AUTH_DIALOG, &CONNECTION_ARGS, "DATA_KEY=gateway\n");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read 'Mock VPN'"));
}

#[test]
fn external_ui_mode_prints_descriptor() {
    let mut args = CONNECTION_ARGS.to_vec();
    args.extend(["--external-ui-mode", "--allow-interaction"]);
    let output = run(AUTH_DIALOG, &args, "DONE\n\nQUIT\n\n");

    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "[VPN Plugin UI]\nVersion=2\nDescription=Tell me all your secrets\nTitle=Authenticate VPN\n\n\
         [password]\nLabel=Password\nIsSecret=true\nShouldAsk=true\n"
    );
}

#[test]
fn external_ui_mode_includes_known_password() {
    let mut args = CONNECTION_ARGS.to_vec();
    args.extend(["--external-ui-mode", "-i"]);
    let output = run(
        AUTH_DIALOG,
        &args,
        "SECRET_KEY=password\nSECRET_VAL=hunter2\nDONE\n",
    );

    let out = stdout(&output);
    assert!(out.contains("Value=hunter2\n"));
    assert!(out.contains("ShouldAsk=false\n"));
}

#[test]
fn verbose_logging_goes_to_stderr_only() {
    let mut args = CONNECTION_ARGS.to_vec();
    args.extend(["--external-ui-mode", "-i", "-vv"]);
    let output = run(AUTH_DIALOG, &args, "DONE\n");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("connection details"));
    assert!(stdout(&output).starts_with("[VPN Plugin UI]\n"));
}

#[test]
fn known_password_round_trips_through_helper() {
    let output = run(
        AUTH_DIALOG,
        &CONNECTION_ARGS,
        "DATA_KEY=gateway\nDATA_VAL=novpn.example.com\n\
         SECRET_KEY=password\nSECRET_VAL=hunter2\nDONE\n\nQUIT\n\n",
    );

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(stdout(&output), "password\nhunter2\n\n");
}

#[test]
fn helper_rejects_wrong_version() {
    let output = run(
        AUTH_DIALOG_GUI,
        &[],
        "[VPN Plugin UI]\nVersion=1\nTitle=T\nDescription=D\n",
    );
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Expected Version=2"));
}

#[test]
fn helper_rejects_garbage() {
    let output = run(AUTH_DIALOG_GUI, &[], "this is not a key file\n");
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("Error: "));
}

#[test]
fn helper_reports_skipped_entries_and_known_values() {
    let output = run(
        AUTH_DIALOG_GUI,
        &["--uuid=ignored"],
        "[VPN Plugin UI]\nVersion=2\nTitle=T\nDescription=D\n\n\
         [nolabel]\nIsSecret=true\nShouldAsk=true\n\n\
         [password]\nLabel=Password\nValue=known\nIsSecret=true\nShouldAsk=false\n",
    );

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Skipping entry: "));
    assert_eq!(stdout(&output), "password\nknown\n\n");
}
