// Litkeys: co-occurrence network keyword discovery for literature reviews
//
// This is the library root. Each module corresponds to one stage of the
// keyword pipeline, plus configuration, errors and output.

pub mod config;
pub mod corpus;
pub mod cutoff;
pub mod error;
pub mod keywords;
pub mod matrix;
pub mod network;
pub mod output;
pub mod pipeline;
pub mod terms;
