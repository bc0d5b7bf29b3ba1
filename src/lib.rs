//! Veridex evaluates submitted research documents against a reference
//! corpus and live external sources: grounded chat, similarity checking,
//! novelty/plagiarism/cost scoring, and schema-validated structured
//! extraction behind one HTTP surface.

pub mod api;
pub mod chat;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod extract;
pub mod generation;
pub mod retrieval;
pub mod scoring;
