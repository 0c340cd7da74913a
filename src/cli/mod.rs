//! CLI module for GreenQuery
//!
//! Provides subcommands for the two transports:
//! - `serve`: HTTP API server
//! - `ask`: one-shot query printing trace steps line-by-line to stdout

pub mod ask;
pub mod serve;

use clap::{Parser, Subcommand};

/// GreenQuery - corrective RAG service for environmental questions
#[derive(Parser)]
#[command(name = "greenquery")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Answer a single query, streaming trace steps to stdout
    Ask(ask::AskArgs),
}
