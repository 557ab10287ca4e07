//! orbitmap: orbital organization maps
//!
//! Layers, innermost first:
//! - `domain`: hierarchy rules, ring geometry, position resolver, mutation engine
//! - `application`: document storage, editing session, drag controller
//! - `infrastructure`: filesystem boundary and service wiring
//! - `cli`: argument parsing and command dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
