//! Core L-system tree library: node records, generation files, growth
//! simulation and tube-mesh synthesis.
//!
//! Main components:
//! - [`node`] — node records and their one-line text encoding.
//! - [`store`] — whole-history load/save in text and binary form.
//! - [`clock`] — the reversible, thread-safe growth clock.
//! - [`growth`] — per-type growth applied to node dimensions.
//! - [`mesh`] — per-node tube geometry generation.
//! - [`weld`] — exact vertex deduplication into an indexed mesh.
//! - [`validate`] — structural checks over generations.
//! - [`scene`] — the hand-off point to whatever renders the mesh.
//! - [`workspace`] — context object tying history, clock and config together.
//! - [`sample`] — random demo trees.
//! - [`config`], [`error`], [`types`] — shared settings, errors and ids.

pub mod clock;
pub mod config;
pub mod error;
pub mod growth;
pub mod mesh;
pub mod node;
pub mod sample;
pub mod scene;
pub mod store;
pub mod types;
pub mod validate;
pub mod weld;
pub mod workspace;
