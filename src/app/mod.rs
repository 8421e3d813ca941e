// logtrail - app/mod.rs
//
// Application layer: the tail loop and the source seam it polls.
// Dependencies: core layer.
// Must NOT depend on: platform specifics.

pub mod tail;
