//! Uploaded résumés: PDF ingestion, storage, and AI analysis.

pub mod analysis;
pub mod handlers;
