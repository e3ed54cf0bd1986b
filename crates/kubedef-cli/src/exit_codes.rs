//! Exit codes beyond the success/error pair miette already provides

/// The queried kind is not known to the registry
pub const NOT_FOUND: i32 = 2;
