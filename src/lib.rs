//! Coverage challenge engine plus the HTTP adapter a CI host drives it through.
//!
//! Engine: `coverage` (report access), `challenge` (the challenge kinds), `factory`
//! (generation). Service: `config`, `state`, `logic`, `protocol`, `routes`, `telemetry`.

pub mod challenge;
pub mod config;
pub mod coverage;
pub mod factory;
pub mod logic;
pub mod protocol;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod util;
