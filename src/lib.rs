//! comptrack: employee hierarchy reconciliation and re-parenting.
//!
//! The flat employee/supervisor relation is the system of record. Every read
//! rebuilds a forest from it, every edit rewrites one row after validation,
//! and the forest is rebuilt again from the store.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
