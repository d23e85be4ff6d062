use crate::common::command::{
    bit_output, get_ancestor_commit_id, get_head_commit_sha, repository_with_multiple_commits,
    run_bit_command,
};
use assert_fs::TempDir;
use predicates::prelude::predicate;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
fn create_annotated_tag_for_head(
    repository_with_multiple_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = repository_with_multiple_commits;
    let head = get_head_commit_sha(repository_dir.path())?;

    run_bit_command(repository_dir.path(), &["tag", "v1", "-m", "First release"])
        .env("GIT_AUTHOR_NAME", "fake_user")
        .env("GIT_AUTHOR_EMAIL", "fake_email@email.com")
        .env("GIT_AUTHOR_DATE", "2023-01-02 09:00:00 +0000")
        .assert()
        .success();

    let tag_object = bit_output(repository_dir.path(), &["cat-file", "-p", "v1"])?;
    assert!(tag_object.starts_with(&format!("object {head}\ntype commit\ntag v1\n")));
    assert!(tag_object.contains("tagger fake_user <fake_email@email.com> 1672650000 +0000"));
    assert!(tag_object.ends_with("First release"));

    let kind = bit_output(repository_dir.path(), &["cat-file", "-t", "v1"])?;
    assert_eq!(kind, "tag");

    Ok(())
}

#[rstest]
fn tag_an_older_commit(
    repository_with_multiple_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = repository_with_multiple_commits;
    let head = get_head_commit_sha(repository_dir.path())?;
    let first = get_ancestor_commit_id(repository_dir.path(), &head, 3)?;

    run_bit_command(repository_dir.path(), &["tag", "v0", "HEAD~3", "-m", "Initial"])
        .assert()
        .success();

    let tag_object = bit_output(repository_dir.path(), &["cat-file", "-p", "v0"])?;
    assert!(tag_object.starts_with(&format!("object {first}\n")));

    // revisions through a tag peel to the tagged commit
    run_bit_command(repository_dir.path(), &["branch", "from-tag", "v0"])
        .assert()
        .success();
    let branch = bit_output(repository_dir.path(), &["rev-list", "from-tag"])?;
    assert_eq!(branch, first);

    Ok(())
}

#[rstest]
fn list_tags_in_name_order(
    repository_with_multiple_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = repository_with_multiple_commits;
    for name in ["v2", "v1", "release/candidate"] {
        run_bit_command(repository_dir.path(), &["tag", name, "-m", name])
            .assert()
            .success();
    }

    let listing = bit_output(repository_dir.path(), &["tag"])?;
    assert_eq!(listing, "release/candidate\nv1\nv2");

    Ok(())
}

#[rstest]
fn duplicate_tag_fails(repository_with_multiple_commits: TempDir) {
    let repository_dir = repository_with_multiple_commits;
    run_bit_command(repository_dir.path(), &["tag", "v1", "-m", "one"])
        .assert()
        .success();

    run_bit_command(repository_dir.path(), &["tag", "v1", "-m", "again"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("tag 'v1' already exists"));
}

#[rstest]
fn tag_without_message_fails(repository_with_multiple_commits: TempDir) {
    run_bit_command(repository_with_multiple_commits.path(), &["tag", "v1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("needs a message"));
}

#[rstest]
fn tag_with_invalid_name_fails(repository_with_multiple_commits: TempDir) {
    run_bit_command(
        repository_with_multiple_commits.path(),
        &["tag", "bad..name", "-m", "nope"],
    )
    .assert()
    .failure()
    .stderr(predicate::str::contains("invalid tag name"));
}

#[rstest]
fn decorated_log_shows_tags(
    repository_with_multiple_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = repository_with_multiple_commits;
    run_bit_command(repository_dir.path(), &["tag", "v1", "HEAD~1", "-m", "one"])
        .assert()
        .success();

    let log = bit_output(
        repository_dir.path(),
        &["log", "--oneline", "--decorate"],
    )?;
    let lines = log.lines().collect::<Vec<_>>();

    assert_eq!(lines.len(), 4);
    assert!(lines[0].contains("(HEAD -> master)"));
    assert!(lines[1].contains("(tag: v1)"));
    assert!(lines[1].ends_with("Third commit"));

    Ok(())
}
