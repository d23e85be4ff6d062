use crate::common::command::{
    bit_output, get_ancestor_commit_id, get_head_commit_sha, repository_with_multiple_commits,
    run_bit_command,
};
use assert_fs::TempDir;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
fn rev_list_prints_every_reachable_commit(
    repository_with_multiple_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = repository_with_multiple_commits;
    let head = get_head_commit_sha(repository_dir.path())?;
    let expected = (0..4)
        .map(|generations| get_ancestor_commit_id(repository_dir.path(), &head, generations))
        .collect::<Result<Vec<_>, _>>()?;

    let listing = bit_output(repository_dir.path(), &["rev-list", "HEAD"])?;

    assert_eq!(listing.lines().collect::<Vec<_>>(), expected);

    Ok(())
}

#[rstest]
#[case(&["rev-list", "--count"], "4")]
#[case(&["rev-list", "--count", "HEAD~1"], "3")]
#[case(&["rev-list", "--count", "HEAD", "^HEAD~2"], "2")]
#[case(&["rev-list", "--count", "HEAD~1", "^HEAD"], "0")]
#[case(&["rev-list", "--count", "--topo-order", "master"], "4")]
fn rev_list_count(
    repository_with_multiple_commits: TempDir,
    #[case] args: &[&str],
    #[case] expected: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let count = bit_output(repository_with_multiple_commits.path(), args)?;

    assert_eq!(count, expected);

    Ok(())
}

#[rstest]
fn rev_list_excludes_hidden_history(
    repository_with_multiple_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = repository_with_multiple_commits;
    let head = get_head_commit_sha(repository_dir.path())?;
    let parent = get_ancestor_commit_id(repository_dir.path(), &head, 1)?;

    let listing = bit_output(repository_dir.path(), &["rev-list", "HEAD", "^HEAD~2"])?;

    assert_eq!(listing, format!("{head}\n{parent}"));

    Ok(())
}

#[rstest]
fn rev_list_reverse(
    repository_with_multiple_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = repository_with_multiple_commits;
    let head = get_head_commit_sha(repository_dir.path())?;

    let listing = bit_output(repository_dir.path(), &["rev-list", "--reverse"])?;

    assert_eq!(listing.lines().last(), Some(head.as_str()));

    Ok(())
}

#[rstest]
fn rev_list_of_overlapping_starts_emits_once(
    repository_with_multiple_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let count = bit_output(
        repository_with_multiple_commits.path(),
        &["rev-list", "--count", "HEAD", "HEAD~1", "master"],
    )?;

    assert_eq!(count, "4");

    Ok(())
}

#[rstest]
fn rev_list_unknown_revision_fails(repository_with_multiple_commits: TempDir) {
    run_bit_command(repository_with_multiple_commits.path(), &["rev-list", "missing"])
        .assert()
        .failure();
}
