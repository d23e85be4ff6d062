use crate::common::file::{FileSpec, write_file};
use assert_cmd::Command;
use assert_fs::TempDir;
use rstest::fixture;
use std::path::Path;

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

#[fixture]
pub fn init_repository_dir(repository_dir: TempDir) -> TempDir {
    run_bit_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    write_file(FileSpec::new(
        repository_dir.path().join("1.txt"),
        "one".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("a").join("2.txt"),
        "two".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("a").join("b").join("3.txt"),
        "three".to_string(),
    ));

    run_bit_command(repository_dir.path(), &["add", "."])
        .assert()
        .success();

    bit_commit(repository_dir.path(), "Initial commit")
        .assert()
        .success();

    repository_dir
}

/// Four commits, each adding `file<n>.txt`, one second apart
#[fixture]
pub fn repository_with_multiple_commits(repository_dir: TempDir) -> TempDir {
    run_bit_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    for (n, message) in ["First", "Second", "Third", "Fourth"].iter().enumerate() {
        write_file(FileSpec::new(
            repository_dir.path().join(format!("file{}.txt", n + 1)),
            format!("content {}", n + 1),
        ));
        run_bit_command(repository_dir.path(), &["add", "."])
            .assert()
            .success();
        bit_commit_at(
            repository_dir.path(),
            &format!("{message} commit"),
            &format!("2023-01-01 12:00:0{n} +0000"),
        )
        .assert()
        .success();
    }

    repository_dir
}

pub fn run_bit_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("bit").expect("Failed to find bit binary");
    cmd.current_dir(dir);
    cmd.env_remove("BIT_LOG");
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}

pub fn bit_commit(dir: &Path, message: &str) -> Command {
    bit_commit_at(dir, message, "2023-01-01 12:00:00 +0000")
}

pub fn bit_commit_at(dir: &Path, message: &str, date: &str) -> Command {
    let mut cmd = run_bit_command(dir, &["commit", "-m", message]);
    cmd.envs(vec![
        ("GIT_AUTHOR_NAME", "fake_user"),
        ("GIT_AUTHOR_EMAIL", "fake_email@email.com"),
        ("GIT_AUTHOR_DATE", date), // %Y-%m-%d %H:%M:%S %z
    ]);
    cmd.env_remove("GIT_COMMITTER_NAME");
    cmd.env_remove("GIT_COMMITTER_EMAIL");
    cmd.env_remove("GIT_COMMITTER_DATE");
    cmd
}

/// Stdout of a successful bit invocation, trimmed
pub fn bit_output(dir: &Path, args: &[&str]) -> Result<String, Box<dyn std::error::Error>> {
    let output = run_bit_command(dir, args).assert().success();

    Ok(String::from_utf8(output.get_output().stdout.clone())?
        .trim()
        .to_string())
}

/// Get the parent commit ID of a given commit by using bit cat-file
pub fn get_parent_commit_id(
    dir: &Path,
    commit_id: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    let stdout = bit_output(dir, &["cat-file", "-p", commit_id])?;

    for line in stdout.lines() {
        if let Some(oid) = line.strip_prefix("parent ") {
            return Ok(oid.to_string());
        }
    }

    Err("No parent found".into())
}

/// Get the Nth ancestor of a commit
pub fn get_ancestor_commit_id(
    dir: &Path,
    commit_id: &str,
    generations: usize,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut current = commit_id.to_string();
    for _ in 0..generations {
        current = get_parent_commit_id(dir, &current)?;
    }
    Ok(current)
}

/// Get the current HEAD commit SHA
pub fn get_head_commit_sha(dir: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let head_path = dir.join(".git").join("HEAD");
    let head_content = std::fs::read_to_string(head_path)?;

    // HEAD file contains either a commit SHA or a ref like "ref: refs/heads/main"
    if let Some(ref_path) = head_content.strip_prefix("ref: ") {
        let ref_file = dir.join(".git").join(ref_path.trim());
        let commit_sha = std::fs::read_to_string(ref_file)?;
        Ok(commit_sha.trim().to_string())
    } else {
        Ok(head_content.trim().to_string())
    }
}
