use crate::common::command::{
    bit_output, get_head_commit_sha, repository_dir, repository_with_multiple_commits,
    run_bit_command,
};
use assert_fs::TempDir;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn summaries(log: &str) -> Vec<String> {
    log.lines()
        .filter_map(|line| line.split_once(' ').map(|(_, summary)| summary.to_string()))
        .collect()
}

#[rstest]
fn log_medium_format(
    repository_with_multiple_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = repository_with_multiple_commits;
    let head = get_head_commit_sha(repository_dir.path())?;

    let log = bit_output(repository_dir.path(), &["log"])?;
    let entries = log.split("\n\ncommit ").collect::<Vec<_>>();

    assert_eq!(entries.len(), 4);
    assert_eq!(
        entries[0],
        format!(
            "commit {head}\n\
             Author: fake_user <fake_email@email.com>\n\
             Date:   Sun Jan 1 12:00:03 2023 +0000\n\
             \n    Fourth commit"
        )
    );
    assert!(entries[3].ends_with("    First commit"));

    Ok(())
}

#[rstest]
fn log_oneline_abbreviates_ids(
    repository_with_multiple_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = repository_with_multiple_commits;
    let head = get_head_commit_sha(repository_dir.path())?;

    let log = bit_output(repository_dir.path(), &["log", "--oneline"])?;

    assert_eq!(
        summaries(&log),
        vec![
            "Fourth commit",
            "Third commit",
            "Second commit",
            "First commit"
        ]
    );
    assert!(log.starts_with(&format!("{} Fourth commit", &head[..7])));

    Ok(())
}

#[rstest]
fn log_format_oneline_keeps_full_ids(
    repository_with_multiple_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = repository_with_multiple_commits;
    let head = get_head_commit_sha(repository_dir.path())?;

    let log = bit_output(repository_dir.path(), &["log", "--format", "oneline"])?;

    assert!(log.starts_with(&format!("{head} Fourth commit")));

    Ok(())
}

#[rstest]
#[case(&["log", "--oneline", "--reverse"])]
#[case(&["log", "--oneline", "--topo-order", "--reverse"])]
#[case(&["log", "--oneline", "--date-order", "--reverse"])]
fn log_reverse_starts_at_the_root(
    repository_with_multiple_commits: TempDir,
    #[case] args: &[&str],
) -> Result<(), Box<dyn std::error::Error>> {
    let log = bit_output(repository_with_multiple_commits.path(), args)?;

    assert_eq!(
        summaries(&log),
        vec![
            "First commit",
            "Second commit",
            "Third commit",
            "Fourth commit"
        ]
    );

    Ok(())
}

#[rstest]
fn log_topo_order_on_linear_history_matches_default(
    repository_with_multiple_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = repository_with_multiple_commits;

    let default_order = bit_output(repository_dir.path(), &["log", "--oneline"])?;
    let topo_order = bit_output(repository_dir.path(), &["log", "--oneline", "--topo-order"])?;

    assert_eq!(default_order, topo_order);

    Ok(())
}

#[rstest]
fn log_excludes_hidden_history(
    repository_with_multiple_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let log = bit_output(
        repository_with_multiple_commits.path(),
        &["log", "--oneline", "HEAD", "^HEAD~2"],
    )?;

    assert_eq!(summaries(&log), vec!["Fourth commit", "Third commit"]);

    Ok(())
}

#[rstest]
fn log_from_a_revision(
    repository_with_multiple_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let log = bit_output(
        repository_with_multiple_commits.path(),
        &["log", "--oneline", "HEAD~2"],
    )?;

    assert_eq!(summaries(&log), vec!["Second commit", "First commit"]);

    Ok(())
}

#[rstest]
fn log_decorate_full_uses_ref_paths(
    repository_with_multiple_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = repository_with_multiple_commits;
    run_bit_command(repository_dir.path(), &["branch", "topic", "HEAD~3"])
        .assert()
        .success();

    let log = bit_output(
        repository_dir.path(),
        &["log", "--oneline", "--decorate=full"],
    )?;
    let lines = log.lines().collect::<Vec<_>>();

    assert!(lines[0].contains("(HEAD -> refs/heads/master)"));
    assert!(lines[3].contains("(refs/heads/topic)"));

    Ok(())
}

#[rstest]
fn log_without_decorate_shows_no_refs(
    repository_with_multiple_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let log = bit_output(repository_with_multiple_commits.path(), &["log", "--oneline"])?;

    assert!(!log.contains("HEAD ->"));

    Ok(())
}

#[rstest]
fn log_without_commits_is_empty(repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    run_bit_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    let log = bit_output(repository_dir.path(), &["log"])?;

    assert_eq!(log, "");

    Ok(())
}

#[rstest]
fn log_unknown_revision_fails(repository_with_multiple_commits: TempDir) {
    run_bit_command(repository_with_multiple_commits.path(), &["log", "nope"])
        .assert()
        .failure();
}
