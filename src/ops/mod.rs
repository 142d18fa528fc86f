//! Recursive trie operations: lookup, path-copy insert, path-copy remove.

pub mod get;
pub mod insert;
pub mod remove;
