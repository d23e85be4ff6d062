//! Core repository components
//!
//! - `database`: loose object store for blobs, trees, commits and tags
//! - `index`: staging area tracking the next commit's snapshot
//! - `refs`: references (branches, tags, HEAD)
//! - `repository`: facade tying the other areas together
//! - `workspace`: working directory file system access

pub mod database;
pub mod index;
pub mod refs;
pub mod repository;
pub mod workspace;
