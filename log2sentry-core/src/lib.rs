#![doc = "log2sentry-core: pipeline library for log2sentry."]

//! This crate holds everything that turns a newline-delimited Sentry JSON log
//! into independently uploadable units: path planning, staging, per-line
//! transcoding, header generation and finalisation.
//! Argument parsing and process exit live in the `log2sentry` CLI crate.
//!
//! # Usage
//! Build a [`prepare::PrepareContext`] and hand it file patterns via
//! [`prepare::prepare_all`].

pub mod config;
pub mod contract;
pub mod error;
pub mod finalize;
pub mod header;
pub mod log2json;
pub mod plan;
pub mod prepare;
pub mod stage;
pub mod transcode;
