use std::path::PathBuf;

use clap::Parser as ClapParser;

/// CLI surface: a single source path plus a verbosity flag, trimmed down
/// from a multi-target driver shape to what a single-file, no-codegen
/// pipeline actually needs.
#[derive(Debug, ClapParser)]
#[command(name = "atomc", about = "Lex, parse, type-check and run an AtomC source file")]
pub struct Cli {
    /// Path to the .atomc source file to run.
    pub path: PathBuf,

    /// Raise log verbosity (-v debug, -vv trace). Overridden by RUST_LOG
    /// if that's set to something more specific.
    #[arg(short, long, action = clap::ArgAction::Count, env = "ATOMC_VERBOSE")]
    pub verbose: u8,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub path: PathBuf,
    pub verbose: u8,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self {
            path: cli.path,
            verbose: cli.verbose,
        }
    }
}

impl Config {
    /// The `EnvFilter` directive for this verbosity level, lowest first:
    /// plain `atomc=info` at 0, widening to `debug` then `trace` as `-v`
    /// flags stack. `RUST_LOG`, if present, still takes precedence (set
    /// via `EnvFilter::from_default_env` at the call site).
    pub fn default_log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "atomc_driver=info,atomc_par=info,atomc_vm=info",
            1 => "atomc_driver=debug,atomc_par=debug,atomc_vm=debug",
            _ => "trace",
        }
    }
}
