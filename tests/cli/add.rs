use crate::common::command::{repository_dir, run_bit_command};
use crate::common::file::{FileSpec, write_file, write_generated_files};
use assert_fs::TempDir;
use bitgraph::Repository;
use predicates::prelude::predicate;
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};

#[fixture]
fn initialized_dir(repository_dir: TempDir) -> TempDir {
    run_bit_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    repository_dir
}

fn staged_paths(dir: &TempDir) -> Vec<String> {
    let repository = Repository::open(dir.path()).expect("failed to open repository");
    let index = repository.index();

    index
        .entries()
        .map(|entry| entry.path_str().unwrap().to_string())
        .collect()
}

#[rstest]
fn add_files_from_nested_directories_to_index_successfully(initialized_dir: TempDir) {
    write_file(FileSpec::new(initialized_dir.path().join("1.txt"), "one".into()));
    write_file(FileSpec::new(initialized_dir.path().join("a/2.txt"), "two".into()));
    write_file(FileSpec::new(initialized_dir.path().join("a/b/3.txt"), "three".into()));

    run_bit_command(initialized_dir.path(), &["add", "."])
        .assert()
        .success();

    assert_eq!(
        staged_paths(&initialized_dir),
        vec!["1.txt", "a/2.txt", "a/b/3.txt"]
    );
}

#[rstest]
fn add_multiple_files_incrementally(initialized_dir: TempDir) {
    let files = write_generated_files(initialized_dir.path(), 5);

    for file in &files {
        let name = file.path.file_name().unwrap().to_string_lossy().to_string();
        run_bit_command(initialized_dir.path(), &["add", &name])
            .assert()
            .success();
    }

    let mut expected = files
        .iter()
        .map(|file| file.path.file_name().unwrap().to_string_lossy().to_string())
        .collect::<Vec<_>>();
    expected.sort();
    assert_eq!(staged_paths(&initialized_dir), expected);
}

#[rstest]
fn adding_a_non_existent_file_fails(initialized_dir: TempDir) {
    run_bit_command(initialized_dir.path(), &["add", "missing.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("did not match any files"));

    assert!(staged_paths(&initialized_dir).is_empty());
}

#[rstest]
fn replace_file_with_directory_successfully(initialized_dir: TempDir) {
    write_file(FileSpec::new(initialized_dir.path().join("a"), "file".into()));
    run_bit_command(initialized_dir.path(), &["add", "a"])
        .assert()
        .success();

    std::fs::remove_file(initialized_dir.path().join("a")).unwrap();
    write_file(FileSpec::new(initialized_dir.path().join("a/nested.txt"), "nested".into()));
    run_bit_command(initialized_dir.path(), &["add", "a"])
        .assert()
        .success();

    assert_eq!(staged_paths(&initialized_dir), vec!["a/nested.txt"]);
}

#[rstest]
fn removing_deleted_files_from_index_successfully(initialized_dir: TempDir) {
    write_file(FileSpec::new(initialized_dir.path().join("keep.txt"), "keep".into()));
    write_file(FileSpec::new(initialized_dir.path().join("dir/gone.txt"), "gone".into()));
    run_bit_command(initialized_dir.path(), &["add", "."])
        .assert()
        .success();

    std::fs::remove_file(initialized_dir.path().join("dir/gone.txt")).unwrap();
    run_bit_command(initialized_dir.path(), &["add", "dir/gone.txt"])
        .assert()
        .success();

    assert_eq!(staged_paths(&initialized_dir), vec!["keep.txt"]);
}
