//! Plumbing commands
//!
//! - `hash-object`: compute an object id and optionally store the object
//! - `cat-file`: print a stored object or its type
//! - `rev-list`: list or count the commits a walk produces

pub mod cat_file;
pub mod hash_object;
pub mod rev_list;
