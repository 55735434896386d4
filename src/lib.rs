//! Council — terminal client for an LLM council.
//!
//! Several models answer a question, rank each other's anonymized answers,
//! and a chairman model writes the final response. This crate groups
//! conversations by day, turns each assistant message into stage blocks,
//! and routes user gestures to a controller as typed intents.

pub mod config;
pub mod controller;
pub mod conversation;
pub mod intent;
pub mod pipeline;
pub mod tui;
