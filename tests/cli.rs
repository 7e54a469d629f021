//! End-to-end runs of the `segoeui-patch` binary

use std::fs;
use std::process::Command;

fn patcher() -> Command {
    Command::new(env!("CARGO_BIN_EXE_segoeui-patch"))
}

#[test]
fn missing_segoe_ui_exits_with_status_1() {
    let prefix = tempfile::tempdir().unwrap();
    let output = patcher().arg(prefix.path()).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.starts_with("ERROR: Segoe UI not found: "),
        "unexpected stderr: {stderr}"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with(&format!("WINEPREFIX: {}\n", prefix.path().display())));
}

#[test]
fn missing_donor_font_exits_with_status_1() {
    let prefix = tempfile::tempdir().unwrap();
    let fonts = prefix.path().join("drive_c").join("windows").join("Fonts");
    fs::create_dir_all(&fonts).unwrap();
    fs::write(fonts.join("segoeui.ttf"), b"placeholder").unwrap();

    let output = patcher().arg(prefix.path()).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("ERROR: Segoe UI Symbol not found: "));
    // Nothing is backed up before both inputs are known to exist
    assert!(!fonts.join("segoeui.ttf.backup").exists());
}

#[test]
fn extra_arguments_are_rejected() {
    let output = patcher().args(["one", "two"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}
