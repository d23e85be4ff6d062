use crate::common::command::{
    bit_commit, bit_output, get_head_commit_sha, get_parent_commit_id, init_repository_dir,
    repository_dir, run_bit_command,
};
use crate::common::file::{FileSpec, write_file};
use assert_fs::TempDir;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
fn first_commit_is_reported_as_root(repository_dir: TempDir) {
    run_bit_command(repository_dir.path(), &["init"])
        .assert()
        .success();
    write_file(FileSpec::new(repository_dir.path().join("1.txt"), "one".into()));
    run_bit_command(repository_dir.path(), &["add", "."])
        .assert()
        .success();

    bit_commit(repository_dir.path(), "Initial commit")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^\[master \(root-commit\) [0-9a-f]{7}\] Initial commit\n$").unwrap());
}

#[rstest]
fn write_commit_object_successfully_for_nested_project(
    init_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let first = get_head_commit_sha(init_repository_dir.path())?;

    write_file(FileSpec::new(
        init_repository_dir.path().join("a/b/4.txt"),
        "four".into(),
    ));
    run_bit_command(init_repository_dir.path(), &["add", "a"])
        .assert()
        .success();
    bit_commit(init_repository_dir.path(), "Second commit")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("[master "))
        .stdout(predicate::str::contains("root-commit").not());

    let second = get_head_commit_sha(init_repository_dir.path())?;
    assert_eq!(get_parent_commit_id(init_repository_dir.path(), &second)?, first);

    let commit_body = bit_output(init_repository_dir.path(), &["cat-file", "-p", "HEAD"])?;
    assert!(commit_body.contains("Second commit"));

    Ok(())
}

#[rstest]
fn commit_without_identity_fails(init_repository_dir: TempDir) {
    run_bit_command(init_repository_dir.path(), &["commit", "-m", "anonymous"])
        .env_remove("GIT_AUTHOR_NAME")
        .env_remove("GIT_AUTHOR_EMAIL")
        .env_remove("GIT_COMMITTER_NAME")
        .env_remove("GIT_COMMITTER_EMAIL")
        .assert()
        .failure()
        .stderr(predicate::str::contains("GIT_AUTHOR_NAME"));
}

#[rstest]
fn empty_message_aborts_commit(init_repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let before = get_head_commit_sha(init_repository_dir.path())?;

    bit_commit(init_repository_dir.path(), "   ")
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty commit message"));

    assert_eq!(get_head_commit_sha(init_repository_dir.path())?, before);

    Ok(())
}
