//! Binary-level smoke test, in the style of the teacher's `tests/basic_test.rs`
//! (`test_bin::get_test_bin` driving the compiled CLI directly).

#[test]
fn hello_file_runs_with_no_errors() {
    let output = test_bin::get_test_bin("wenyan")
        .arg("tests/fixtures/hello.wy")
        .output()
        .expect("failed to start wenyan");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).is_empty());
    assert!(String::from_utf8_lossy(&output.stdout).contains("問天地好在"));
}

#[test]
fn dump_tokens_flag_exits_before_evaluation() {
    let output = test_bin::get_test_bin("wenyan")
        .arg("--dump-tokens")
        .arg("tests/fixtures/hello.wy")
        .output()
        .expect("failed to start wenyan");

    assert!(output.status.success());
    assert!(!String::from_utf8_lossy(&output.stdout).is_empty());
}
