//! Progress reporting for council phases

pub mod reporter;
