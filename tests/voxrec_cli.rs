use std::process::Command;

fn combined_output(output: &std::process::Output) -> String {
    let mut combined = String::new();
    combined.push_str(&String::from_utf8_lossy(&output.stdout));
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined
}

fn voxrec_bin() -> &'static str {
    option_env!("CARGO_BIN_EXE_voxrec").expect("voxrec test binary not built")
}

#[test]
fn voxrec_help_lists_recording_flags() {
    let output = Command::new(voxrec_bin())
        .arg("--help")
        .output()
        .expect("run voxrec --help");
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("--threshold"));
    assert!(combined.contains("--silence-seconds"));
    assert!(combined.contains("--list-input-devices"));
}

#[test]
fn voxrec_lists_test_devices() {
    let output = Command::new(voxrec_bin())
        .arg("--list-input-devices")
        .env("VOXREC_TEST_DEVICES", "Built-in Mic,USB Mic")
        .output()
        .expect("run voxrec --list-input-devices");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[0] Built-in Mic (default)"));
    assert!(stdout.contains("[1] USB Mic"));
}

#[test]
fn voxrec_reports_empty_device_list() {
    let output = Command::new(voxrec_bin())
        .arg("--list-input-devices")
        .env("VOXREC_TEST_DEVICES", "")
        .output()
        .expect("run voxrec --list-input-devices");
    assert!(output.status.success());
    assert!(combined_output(&output).contains("No audio input devices detected."));
}

#[test]
fn voxrec_rejects_out_of_range_threshold() {
    let output = Command::new(voxrec_bin())
        .args(["--threshold", "40000", "--no-logs"])
        .output()
        .expect("run voxrec --threshold 40000");
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("--threshold must be between"));
}
