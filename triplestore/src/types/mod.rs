mod pattern;
mod triple;

pub use pattern::Pattern;
pub use triple::{Field, TermViolation, Triple, check_term};
