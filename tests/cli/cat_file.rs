use crate::common::command::{get_head_commit_sha, init_repository_dir, run_bit_command};
use assert_fs::TempDir;
use predicates::prelude::predicate;
use rstest::rstest;

#[rstest]
fn print_commit_object(init_repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let head = get_head_commit_sha(init_repository_dir.path())?;

    run_bit_command(init_repository_dir.path(), &["cat-file", "-p", &head])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^tree [0-9a-f]{40}\n")?)
        .stdout(predicate::str::contains(
            "author fake_user <fake_email@email.com> 1672574400 +0000",
        ))
        .stdout(predicate::str::contains("\n\nInitial commit\n"));

    Ok(())
}

#[rstest]
fn print_root_tree_through_revision(
    init_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let tree = run_bit_command(init_repository_dir.path(), &["cat-file", "-p", "master"])
        .assert()
        .success();
    let stdout = String::from_utf8(tree.get_output().stdout.clone())?;
    let tree_oid = stdout
        .lines()
        .next()
        .and_then(|line| line.strip_prefix("tree "))
        .ok_or("commit without tree line")?
        .to_string();

    run_bit_command(init_repository_dir.path(), &["cat-file", "-p", &tree_oid])
        .assert()
        .success()
        .stdout(predicate::str::is_match(
            r"^100644 blob [0-9a-f]{40}\t1\.txt\n040000 tree [0-9a-f]{40}\ta\n$",
        )?);

    Ok(())
}

#[rstest]
fn raw_output_is_the_stored_payload(
    init_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repository_dir.path();
    let pretty_commit = run_bit_command(dir, &["cat-file", "-p", "HEAD"]).assert().success();
    let pretty_commit = String::from_utf8(pretty_commit.get_output().stdout.clone())?;
    let tree_oid = pretty_commit
        .lines()
        .next()
        .and_then(|line| line.strip_prefix("tree "))
        .ok_or("commit without tree line")?
        .to_string();

    run_bit_command(dir, &["cat-file", "HEAD"])
        .assert()
        .success()
        .stdout(pretty_commit);

    let raw_tree = run_bit_command(dir, &["cat-file", &tree_oid]).assert().success();
    let raw_tree = raw_tree.get_output().stdout.clone();
    assert!(raw_tree.starts_with(b"100644 1.txt\0"));
    assert!(!String::from_utf8_lossy(&raw_tree).contains("blob"));

    Ok(())
}

#[rstest]
fn print_object_type(init_repository_dir: TempDir) {
    run_bit_command(init_repository_dir.path(), &["cat-file", "-t", "HEAD"])
        .assert()
        .success()
        .stdout("commit\n");
}

#[rstest]
fn unknown_revision_fails(init_repository_dir: TempDir) {
    run_bit_command(init_repository_dir.path(), &["cat-file", "-p", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ambiguous argument 'nope'"));
}
