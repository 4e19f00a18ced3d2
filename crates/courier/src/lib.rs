//! Courier - Thin web relay between a browser chat UI and external backends
//!
//! This crate provides a small HTTP service that accepts a chat message plus
//! an optional file upload and forwards the payload either to a
//! workflow-automation webhook or to a tool-calling LLM agent, relaying the
//! single synchronous response back to the browser as JSON.

pub mod agent;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod relay;
pub mod web;

pub use error::CourierError;
