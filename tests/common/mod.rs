#![allow(dead_code)]

pub mod command;
pub mod file;

use bitgraph::Repository;
use bitgraph::artifacts::objects::object_id::ObjectId;
use bitgraph::artifacts::objects::signature::Signature;
use bitgraph::artifacts::objects::tree::Tree;

/// Store an empty tree and commit it with the given parents and committer time
pub fn commit_at(
    repository: &Repository,
    parents: &[ObjectId],
    time: i64,
    message: &str,
) -> ObjectId {
    let tree_oid = repository
        .database()
        .store(&Tree::from_entries(Vec::new()).expect("empty tree"))
        .expect("failed to store tree");
    let signature = Signature::new("fake_user", "fake_email@email.com", time, 0);

    repository
        .create_commit(
            &tree_oid,
            parents,
            signature.clone(),
            signature,
            &format!("{message}\n"),
            None,
        )
        .expect("failed to create commit")
}
