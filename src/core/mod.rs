// logtrail - core/mod.rs
//
// Core business logic layer: wire model, reports, row output.
// Must NOT depend on: app, platform, or any network crate.

pub mod export;
pub mod model;
pub mod report;
