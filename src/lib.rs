//! jobreel - turns job postings into short vertical videos
//!
//! This library crate exposes the render pipeline for the binary and for
//! integration testing.

pub mod acquisition;
pub mod collab;
pub mod config;
pub mod pipeline;
pub mod planning;
pub mod publish;
pub mod quality;
pub mod server;
pub mod state;
