//! Parses `ovs-ofctl dump-flows` output into structured flows, relabels
//! cookies, tables, matches and actions, and renders them back as text or
//! JSON.

pub mod cliopt;
pub mod config;
pub mod error;
pub mod flow;
pub mod input;
pub mod mapping;
pub mod output;
pub mod runner;
