use crate::common::command::{repository_dir, run_bit_command};
use assert_fs::TempDir;
use assert_fs::prelude::{FileWriteStr, PathChild};
use predicates::prelude::predicate;
use rstest::rstest;

const HELLO_OID: &str = "ce013625030ba8dba906f756967f9e9ca394464a";

#[rstest]
fn hash_object_without_write_stores_nothing(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    run_bit_command(repository_dir.path(), &["init"])
        .assert()
        .success();
    repository_dir.child("hello.txt").write_str("hello\n")?;

    run_bit_command(repository_dir.path(), &["hash-object", "hello.txt"])
        .assert()
        .success()
        .stdout(format!("{HELLO_OID}\n"));

    let object_path = repository_dir
        .path()
        .join(".git/objects")
        .join(&HELLO_OID[..2])
        .join(&HELLO_OID[2..]);
    assert!(!object_path.exists());

    Ok(())
}

#[rstest]
fn write_blob_object_successfully(repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    run_bit_command(repository_dir.path(), &["init"])
        .assert()
        .success();
    repository_dir.child("hello.txt").write_str("hello\n")?;

    run_bit_command(repository_dir.path(), &["hash-object", "-w", "hello.txt"])
        .assert()
        .success()
        .stdout(format!("{HELLO_OID}\n"));

    let object_path = repository_dir
        .path()
        .join(".git/objects")
        .join(&HELLO_OID[..2])
        .join(&HELLO_OID[2..]);
    assert!(object_path.is_file());

    run_bit_command(repository_dir.path(), &["cat-file", "-p", HELLO_OID])
        .assert()
        .success()
        .stdout("hello\n");

    Ok(())
}

#[rstest]
fn hash_object_of_missing_file_fails(repository_dir: TempDir) {
    run_bit_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    run_bit_command(repository_dir.path(), &["hash-object", "missing.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.txt"));
}
