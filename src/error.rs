use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Search(#[from] SearchError),
}

#[derive(Debug, Error, PartialEq)]
pub enum SearchError {
    #[error("the controlled side has no legal action")]
    NoLegalActions,
}

#[derive(Debug, Error, PartialEq)]
pub enum LpError {
    #[error("linear program is infeasible")]
    Infeasible,

    #[error("linear program is unbounded")]
    Unbounded,

    #[error("simplex did not converge within {0} pivots")]
    IterationLimit(usize),

    #[error("empty payoff matrix")]
    EmptyMatrix,

    #[error("non-finite coefficient")]
    NonFinite,
}
