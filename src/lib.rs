//! # Health Context
//!
//! Turns a user's health records into a retrieval-ready chunk corpus and
//! answers questions over it.
//!
//! Chat messages, symptom logs and activity logs are read from the app's
//! SQLite database; free-text notes come from a directory on disk. Each
//! category has its own source adapter that renders records into
//! [`Chunk`](models::Chunk)s. The corpus is rebuilt on every question and
//! never stored.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────┐   ┌────────────┐   ┌───────────┐
//! │   Adapters   │──▶│ Windowing │──▶│ Aggregator │──▶│ Retrieval │
//! │ msg/sym/act/ │   │ 20 lines  │   │   corpus   │   │   gate    │
//! │  doc/note    │   │ 800 chars │   └────────────┘   └─────┬─────┘
//! └──────────────┘   └───────────┘                          │
//!                                          ┌────────────────┤
//!                                          ▼                ▼
//!                                     ┌─────────┐     ┌──────────┐
//!                                     │   CLI   │     │   HTTP   │
//!                                     │ (hctx)  │     │ POST /ask│
//!                                     └─────────┘     └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! hctx init                         # create record tables
//! hctx sources                      # check what is reachable
//! hctx corpus --session abc         # dump the corpus for a session
//! hctx ask "How did I sleep?" --session abc --k 5
//! hctx serve                        # start the HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Error taxonomy |
//! | [`store`] | Read-only record store |
//! | [`window`] | Fixed-size windowing |
//! | [`sources`] | Adapter trait and fail-soft policy |
//! | [`source_messages`] | Chat transcript adapter |
//! | [`source_symptoms`] | Symptom log adapter |
//! | [`source_activity`] | Activity log adapter |
//! | [`source_notes`] | Notes directory adapter |
//! | [`source_documents`] | Document adapter (disabled) |
//! | [`corpus`] | Chunk aggregation |
//! | [`retrieval`] | Retrieval gate and rankers |
//! | [`ask`] | Query orchestration |
//! | [`server`] | HTTP server |
//! | [`db`] | Database connection |
//! | [`migrate`] | Record table bootstrap |

pub mod ask;
pub mod config;
pub mod corpus;
pub mod db;
pub mod error;
pub mod migrate;
pub mod models;
pub mod retrieval;
pub mod server;
pub mod source_activity;
pub mod source_documents;
pub mod source_messages;
pub mod source_notes;
pub mod source_symptoms;
pub mod sources;
pub mod store;
pub mod window;
