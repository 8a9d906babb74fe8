pub mod clique;
pub mod community;
pub mod louvain;
pub mod table;

/// Node ids of one aligned group, ascending.
pub type AlignmentGroup = Vec<usize>;
