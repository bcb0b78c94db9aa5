// Runs the built `score` binary.

use std::io::Write;
use std::process::{Command, Stdio};

fn score() -> Command {
    Command::new(env!("CARGO_BIN_EXE_score"))
}

#[test]
fn no_model_exits_with_status_two_and_no_output() {
    let output = score().stdin(Stdio::null()).output().expect("run score");
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
}

#[test]
fn faulty_line_is_reported_and_batch_continues() {
    let mut model = tempfile::NamedTempFile::new().expect("temp file");
    model
        .write_all(b"\\1-grams:\n-1.0\ta\n-2.0\tb\n\\end\\\n")
        .expect("write model");

    let mut child = score()
        .arg(model.path())
        .args(["--precision", "2"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("run score");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(b"ab\na b a\nb\n")
        .expect("write input");
    let output = child.wait_with_output().expect("wait");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "-6.91 ab\n-4.61 b\n");
    assert!(String::from_utf8_lossy(&output.stderr).contains("error scoring: a b a"));
}
