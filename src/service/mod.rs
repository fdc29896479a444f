//! Request validation shared by the API handlers.

mod validation;
pub use validation::{RequestValidator, NAME_MAX_LENGTH};
