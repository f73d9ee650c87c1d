//! A small Unix shell.
//!
//! A line is split into words by [`tokenizer`]. If the first word names a
//! builtin it runs in-process. Otherwise [`parser::scan`] cuts the words into
//! pipeline segments, [`wiring::build`] connects them with pipes and
//! redirection files, [`launch::launch`] forks and executes each segment,
//! and [`job::supervise`] reaps them. [`eval::run_pipeline`] runs the whole
//! sequence.

#[macro_use]
extern crate log;

pub mod builtin;
pub mod config;
pub mod error;
pub mod eval;
pub mod global;
pub mod job;
pub mod launch;
pub mod logging;
pub mod parser;
pub mod search;
pub mod tokenizer;
pub mod types;
pub mod wiring;
