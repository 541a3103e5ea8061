//! End-to-end tests driving the `atomc` binary over real source files,
//! one per scenario in the language's testable-properties list.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn atomc_bin() -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_BIN_EXE_atomc"))
}

fn source_file(src: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().expect("failed to create temp source file");
    write!(f, "{src}").expect("failed to write temp source file");
    f
}

#[test]
fn integer_for_loop_prints_each_iteration() {
    let file = source_file(
        r#"
        void main() {
            int i;
            for (i = 0; i < 3; i = i + 1) put_i(i);
        }
        "#,
    );

    Command::new(atomc_bin())
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("=> 0").and(predicate::str::contains("=> 1")).and(predicate::str::contains("=> 2")));
}

#[test]
fn double_for_loop_prints_each_iteration() {
    let file = source_file(
        r#"
        void main() {
            double x;
            for (x = 0.0; x < 1.5; x = x + 0.5) put_d(x);
        }
        "#,
    );

    Command::new(atomc_bin())
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("=> 0.0").and(predicate::str::contains("=> 0.5")).and(predicate::str::contains("=> 1.0")));
}

#[test]
fn explicit_cast_truncates_toward_zero() {
    let file = source_file(
        r#"
        int x;
        void main() {
            x = (int)2.7;
            put_i(x);
        }
        "#,
    );

    Command::new(atomc_bin())
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("=> 2"));
}

#[test]
fn redefinition_is_rejected_at_its_line() {
    let file = source_file("int a;\nint a;\n");

    Command::new(atomc_bin())
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2").and(predicate::str::contains("redefinition")));
}

#[test]
fn undeclared_struct_type_is_rejected() {
    let file = source_file("struct P p;\n");

    Command::new(atomc_bin())
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no struct definition").and(predicate::str::contains("P")));
}

#[test]
fn call_with_too_few_arguments_is_rejected() {
    let file = source_file(
        r#"
        void f(int a) {}
        void main() {
            f();
        }
        "#,
    );

    Command::new(atomc_bin())
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("too few arguments"));
}
