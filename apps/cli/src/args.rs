//! Command-line argument parsing

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Upload encrypted files to, and download them from, a sealpost inbox
#[derive(Parser, Debug)]
#[command(name = "sealpost", author, version, about, long_about = None)]
pub struct Args {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload Crypt4GH files or directories to the inbox
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Continue previously interrupted uploads
        #[arg(short, long)]
        resume: bool,

        /// Upload straight to the storage backend with a session token
        #[arg(short, long)]
        direct: bool,
    },

    /// Download files from the outbox into the current directory
    Download {
        #[arg(required = true)]
        names: Vec<String>,

        /// Download straight from the storage backend with a session token
        #[arg(short, long)]
        direct: bool,
    },

    /// List inbox files, or outbox files with --outbox
    Files {
        #[arg(short, long)]
        outbox: bool,

        /// Delete a file from the inbox instead of listing
        #[arg(long, value_name = "NAME", conflicts_with = "outbox")]
        delete: Option<String>,
    },

    /// List resumable uploads
    Resumables {
        /// Delete a resumable upload instead of listing
        #[arg(long, value_name = "ID")]
        delete: Option<String>,
    },
}
