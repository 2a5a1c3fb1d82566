//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--debug`: Enable debug output
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ocfl - validate and build OCFL preservation storage
#[derive(Parser, Debug)]
#[command(name = "ocfl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; findings are suppressed, the summary still prints
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate an OCFL object or storage root
    #[command(
        name = "validate",
        long_about = "Validate an OCFL object or storage root.\n\n\
            The path is inspected for a namaste declaration file to decide \
            whether it is a single object or a whole storage root. Every \
            violated rule is reported as a coded finding; validation never \
            stops at the first problem. The exit status is nonzero when any \
            error-severity finding was recorded.",
        after_help = "\
EXAMPLES:
    # Validate one object, errors only
    ocfl validate /data/objects/obj1

    # Validate a storage root, including warnings
    ocfl validate /data/root --warnings

    # Skip content digest recomputation (fast structural check)
    ocfl validate /data/root --no-digests"
    )]
    Validate {
        /// Object or storage root directory
        path: PathBuf,

        /// Also report warning-severity findings
        #[arg(long)]
        warnings: bool,

        /// Accept any registered digest algorithm as the primary one
        #[arg(long)]
        lax_digests: bool,

        /// Skip content digest recomputation
        #[arg(long)]
        no_digests: bool,

        /// Load validation code descriptions from this file instead of the
        /// builtin catalog
        #[arg(long, value_name = "FILE")]
        codes: Option<PathBuf>,
    },

    /// Create a new OCFL object from a source directory
    Create {
        /// Object identifier, a URI
        #[arg(long)]
        id: String,

        /// Directory whose tree becomes version 1
        #[arg(long, value_name = "DIR")]
        src: PathBuf,

        /// Destination object directory (must not exist)
        #[arg(long, value_name = "DIR")]
        objdir: PathBuf,

        /// Primary digest algorithm
        #[arg(long, default_value = "sha512")]
        digest: String,

        /// Extra fixity algorithm (repeatable)
        #[arg(long, value_name = "ALGORITHM")]
        fixity: Vec<String>,

        /// Version message
        #[arg(short, long)]
        message: Option<String>,

        /// Name of the user creating the version
        #[arg(long)]
        name: Option<String>,

        /// Address of the user creating the version
        #[arg(long, requires = "name")]
        address: Option<String>,

        /// Zero-padding width for version names (0 = unpadded)
        #[arg(long, default_value_t = 0)]
        padding: usize,

        /// File name to skip when collecting sources (repeatable)
        #[arg(long, value_name = "NAME", default_values_t = default_skips())]
        skip: Vec<String>,
    },

    /// Add a new version to an existing object from a source directory
    Update {
        /// Object directory
        #[arg(long, value_name = "DIR")]
        objdir: PathBuf,

        /// Directory whose tree becomes the new version state
        #[arg(long, value_name = "DIR")]
        src: PathBuf,

        /// Version message
        #[arg(short, long)]
        message: Option<String>,

        /// Name of the user creating the version
        #[arg(long)]
        name: Option<String>,

        /// Address of the user creating the version
        #[arg(long, requires = "name")]
        address: Option<String>,

        /// File name to skip when collecting sources (repeatable)
        #[arg(long, value_name = "NAME", default_values_t = default_skips())]
        skip: Vec<String>,
    },

    /// Show the inventory of an object
    Show {
        /// Object directory
        objdir: PathBuf,

        /// Show the file listing of this version instead of the history
        #[arg(long, value_name = "VERSION")]
        version: Option<String>,
    },

    /// Initialize a new storage root
    #[command(name = "init-root")]
    InitRoot {
        /// Storage root directory to create
        root: PathBuf,

        /// Layout policy: direct, hashed-n-tuple, or none
        #[arg(long, default_value = "hashed-n-tuple")]
        layout: String,
    },
}

fn default_skips() -> Vec<String> {
    vec!["README.md".to_string(), ".DS_Store".to_string()]
}
