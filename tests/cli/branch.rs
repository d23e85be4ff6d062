use crate::common::command::{
    bit_output, get_ancestor_commit_id, get_head_commit_sha, get_parent_commit_id,
    repository_dir, repository_with_multiple_commits, run_bit_command,
};
use assert_fs::TempDir;
use predicates::prelude::predicate;
use pretty_assertions::{assert_eq, assert_ne};
use rstest::rstest;
use std::path::Path;

fn branch_target(dir: &Path, name: &str) -> Result<String, Box<dyn std::error::Error>> {
    let path = dir.join(".git").join("refs").join("heads").join(name);

    Ok(std::fs::read_to_string(path)?.trim().to_string())
}

#[rstest]
fn create_branch_from_head(
    repository_with_multiple_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = repository_with_multiple_commits;
    let head = get_head_commit_sha(repository_dir.path())?;

    run_bit_command(repository_dir.path(), &["branch", "topic"])
        .assert()
        .success();

    assert_eq!(branch_target(repository_dir.path(), "topic")?, head);

    Ok(())
}

#[rstest]
fn create_branch_from_parent_of_head(
    repository_with_multiple_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = repository_with_multiple_commits;
    let head = get_head_commit_sha(repository_dir.path())?;
    let expected_parent_id = get_parent_commit_id(repository_dir.path(), &head)?;

    run_bit_command(repository_dir.path(), &["branch", "parent-branch", "HEAD^"])
        .assert()
        .success();

    let branch_content = branch_target(repository_dir.path(), "parent-branch")?;
    assert_eq!(branch_content, expected_parent_id);
    assert_ne!(branch_content, head);

    Ok(())
}

#[rstest]
fn create_branch_from_ancestor_and_its_parent(
    repository_with_multiple_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = repository_with_multiple_commits;
    let head = get_head_commit_sha(repository_dir.path())?;
    let expected_main_id = get_ancestor_commit_id(repository_dir.path(), &head, 2)?;
    let expected_parent_of_main_id = get_parent_commit_id(repository_dir.path(), &expected_main_id)?;

    run_bit_command(repository_dir.path(), &["branch", "main", "HEAD~2"])
        .assert()
        .success();
    run_bit_command(repository_dir.path(), &["branch", "parent-of-main", "main^"])
        .assert()
        .success();

    assert_eq!(branch_target(repository_dir.path(), "main")?, expected_main_id);
    assert_eq!(
        branch_target(repository_dir.path(), "parent-of-main")?,
        expected_parent_of_main_id
    );

    Ok(())
}

#[rstest]
fn create_branch_from_grandparent_with_alias(
    repository_with_multiple_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = repository_with_multiple_commits;
    let head = get_head_commit_sha(repository_dir.path())?;
    let expected = get_ancestor_commit_id(repository_dir.path(), &head, 2)?;

    run_bit_command(repository_dir.path(), &["branch", "grandparent", "@^^"])
        .assert()
        .success();

    assert_eq!(branch_target(repository_dir.path(), "grandparent")?, expected);

    Ok(())
}

#[rstest]
fn create_branch_from_abbreviated_oid(
    repository_with_multiple_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = repository_with_multiple_commits;
    let head = get_head_commit_sha(repository_dir.path())?;
    let first = get_ancestor_commit_id(repository_dir.path(), &head, 3)?;

    run_bit_command(repository_dir.path(), &["branch", "from-oid", &first[..8]])
        .assert()
        .success();

    assert_eq!(branch_target(repository_dir.path(), "from-oid")?, first);

    Ok(())
}

#[rstest]
fn create_branch_from_non_commit_oid_fails(
    repository_with_multiple_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = repository_with_multiple_commits;
    let commit = bit_output(repository_dir.path(), &["cat-file", "-p", "HEAD"])?;
    let tree = commit
        .lines()
        .next()
        .and_then(|line| line.strip_prefix("tree "))
        .ok_or("commit without tree line")?;

    run_bit_command(repository_dir.path(), &["branch", "from-tree", tree])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected a commit"));

    Ok(())
}

#[rstest]
fn create_branch_from_nonexistent_ref_fails(repository_with_multiple_commits: TempDir) {
    run_bit_command(
        repository_with_multiple_commits.path(),
        &["branch", "new-branch", "nonexistent^"],
    )
    .assert()
    .failure();
}

#[rstest]
fn create_duplicate_branch_fails(repository_with_multiple_commits: TempDir) {
    run_bit_command(repository_with_multiple_commits.path(), &["branch", "master"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("branch 'master' already exists"));
}

#[rstest]
#[case("invalid name")]
#[case(".hidden")]
#[case("double..dot")]
#[case("ends.lock")]
#[case("trailing/")]
fn create_branch_with_invalid_name_fails(
    repository_with_multiple_commits: TempDir,
    #[case] name: &str,
) {
    run_bit_command(repository_with_multiple_commits.path(), &["branch", name])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid branch name"));
}

#[rstest]
fn create_branch_without_commits_fails(repository_dir: TempDir) {
    run_bit_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    run_bit_command(repository_dir.path(), &["branch", "topic"])
        .assert()
        .failure();
}

#[rstest]
fn list_branches_marks_the_current_one(
    repository_with_multiple_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = repository_with_multiple_commits;
    run_bit_command(repository_dir.path(), &["branch", "feature/x"])
        .assert()
        .success();

    let listing = bit_output(repository_dir.path(), &["branch"])?;

    assert_eq!(listing, "feature/x\n* master");

    Ok(())
}
