// "No route found" is a normal outcome (an empty RaptorRoute), not an error.
// RaptorError is reserved for invariant violations that should abort a
// query, raised only on reconstruction trouble.
#[derive(thiserror::Error, Debug)]
pub enum RaptorError {
    #[error("predecessor chain exceeded {max_legs} legs while reconstructing a route; the chain is likely cyclic")]
    PredecessorCycle { max_legs: usize },

    #[error("graph view invariant violated: {0}")]
    InvalidGraphView(String),
}
