use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum PathError {
    #[error("A phase point needs an order parameter with at least one component")]
    EmptyOrderParameter,
    #[error("Segment {requested} was requested, but the path has {available} segment(s)")]
    SegmentNotFound { requested: usize, available: usize },
}
