// Co-occurrence network and degree analysis.

pub mod degree;
pub mod graph;
