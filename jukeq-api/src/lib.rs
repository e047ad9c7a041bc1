//! Jukeq API service library
//!
//! The collaborative music-queue engine: visitors submit video links into a
//! shared playlist during an admin-controlled session, vote songs up/down,
//! and watch the queue reorder live over SSE.
//!
//! Component map:
//! - [`store`] - all database reads/writes (nothing else touches the tables)
//! - [`session`] - session lifecycle and admission policy
//! - [`voting`] - vote toggle/flip semantics and score upkeep
//! - [`ranking`] - the deterministic queue ordering
//! - [`sequencer`] - queued -> playing -> played state machine
//! - [`submit`] - song submission (metadata resolution, content heuristics)
//! - [`sse`] - broadcast fan-out to connected viewers
//! - [`api`] - HTTP surface

pub mod api;
pub mod message;
pub mod ranking;
pub mod resolver;
pub mod sequencer;
pub mod session;
pub mod sse;
pub mod store;
pub mod submit;
pub mod voting;
