//! Command-line interface for repopulse
//!
//! Two commands are provided:
//!
//! - **collect**: loads the configuration, runs the phase pipeline against GitHub for the
//!   selected project, and writes the output bundle as pretty-printed JSON to a file or to
//!   the host's output. A fatal pipeline error is reported on the host's error stream with
//!   its class, numbered suggestions and context, and the process exits with status 1.
//! - **init**: writes the default configuration file.
//!
//! Configuration lives in `repopulse.toml` (or the file named by `--config`); the embedded
//! `default_config.toml` supplies the defaults.

mod collect;
mod config;
mod host;
mod init;
mod run;

pub use collect::{CollectArgs, process_collect};
pub use config::Config;
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use run::run;
