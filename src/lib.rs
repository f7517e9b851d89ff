//! Persistent context memory for coding agents whose conversation context
//! is periodically wiped.
//!
//! The server exposes a small set of MCP tools over stdio so an assistant
//! can stash short structured **insights**, externalize large conversation
//! fragments as immutable content-addressed **chunks**, and retrieve either
//! by ID, regex, fuzzy match, BM25 ranking, hybrid semantic similarity, or
//! metadata filters.
//!
//! # Architecture
//!
//! - **Storage**: plain files under one root — JSON indexes guarded by
//!   advisory locks and atomic writes, one Markdown file per chunk, a gzip
//!   archive zone for cold data
//! - **Search**: in-process BM25 over chunks and insights, optionally fused
//!   with cosine similarity from a pluggable embedding provider
//! - **Retention**: three-zone lifecycle (active → archive → purge) with
//!   immunity rules and transparent restore-on-read
//! - **Transport**: MCP over stdio
//!
//! # Modules
//!
//! - [`config`] — TOML configuration and environment overrides
//! - [`store`] — the storage engine: chunks, insights, sessions, retention
//! - [`search`] — tokenizer, BM25, fuzzy scoring, hybrid fusion
//! - [`embedding`] — embedding provider trait and back-ends
//! - [`tools`] — the MCP tool surface

pub mod config;
pub mod embedding;
pub mod error;
pub mod search;
pub mod server;
pub mod store;
pub mod tools;
