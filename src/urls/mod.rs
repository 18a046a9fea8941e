//! URL validation and normalization
//!
//! Raw user input is validated first, then reduced to its `scheme://host`
//! identity key which is what the store deduplicates on.

mod normalize;
mod validate;

pub use normalize::normalize;
pub use validate::{validate, MAX_URL_LENGTH};
