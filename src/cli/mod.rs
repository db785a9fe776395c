//! CLI module for the account service
//!
//! Provides subcommands:
//! - `serve`: run the HTTP API
//! - `hash-password`: print an Argon2 hash for a password read from stdin

pub mod hash_password;
pub mod serve;

use clap::{Parser, Subcommand};

/// Account service - registration, authentication and role-gated profiles
#[derive(Parser)]
#[command(name = "account-service")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Hash a password read from stdin, for seeding accounts by hand
    HashPassword,
}
