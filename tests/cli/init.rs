use crate::common::command::{repository_dir, run_bit_command};
use assert_fs::TempDir;
use predicates::prelude::predicate;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
fn init_repository_successfully(repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let dir_absolute_path = repository_dir.path().canonicalize()?.display().to_string();

    run_bit_command(repository_dir.path(), &["init"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(
            r"(?m)^Initialized empty Git repository in .+$",
        )?)
        .stdout(predicate::str::contains(dir_absolute_path));

    let head = std::fs::read_to_string(repository_dir.path().join(".git").join("HEAD"))?;
    assert_eq!(head, "ref: refs/heads/master\n");
    assert!(repository_dir.path().join(".git/objects").is_dir());
    assert!(repository_dir.path().join(".git/refs/heads").is_dir());
    assert!(repository_dir.path().join(".git/refs/tags").is_dir());

    Ok(())
}

#[rstest]
fn init_repository_at_given_path(repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let target = repository_dir.path().join("nested").join("project");

    run_bit_command(repository_dir.path(), &["init", "nested/project"])
        .assert()
        .success();

    assert!(target.join(".git").join("HEAD").is_file());

    Ok(())
}

#[rstest]
fn commands_outside_a_repository_fail(repository_dir: TempDir) {
    run_bit_command(repository_dir.path(), &["log"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a bit repository"));
}
