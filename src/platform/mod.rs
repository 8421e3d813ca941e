// logtrail - platform/mod.rs
//
// Platform layer: config file location and loading, HTTP transport.
// Dependencies: core and app (to implement `ActionSource`), directories, reqwest.

pub mod config;
pub mod http;
