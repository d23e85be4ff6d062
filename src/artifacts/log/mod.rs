//! Commit history traversal
//!
//! `rev_list` walks the commit graph from pushed commits, suppressing hidden
//! ones, in breadth-first, time, topological or reversed order.

pub mod rev_list;
