//! Orchestration of a Loom generation run.
//!
//! A run fetches a design tree, parses it, then resolves tokens and infers
//! layout on the blocking pool while the asset pipeline fetches images.
//! Emission and validation start once all three have finished. Output is
//! written only when validation reports no errors, and then all at once.
//!
//! ```no_run
//! use loom_engine::{config::load_config, Engine, MemorySource};
//! use std::path::Path;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("loom.toml")?;
//! let engine = Engine::new(&config)?;
//! let source = MemorySource::new().with_tree("card", r#"{"name":"Card","root":{"id":"root","geometry":{"x":0,"y":0,"width":10,"height":10}}}"#);
//! let (output, paths) = engine.run(&source, "card", Path::new("out")).await?;
//! println!("{} warnings, wrote {:?}", output.report.warnings.len(), paths);
//! # Ok(())
//! # }
//! ```

pub mod config;
mod engine;
mod memory;
mod source;
mod writer;

pub use engine::{Engine, RunFailure, RunOutput};
pub use memory::MemorySource;
pub use source::DesignSource;
pub use writer::{write_all_or_nothing, OutputFile};
