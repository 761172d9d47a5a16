/// Reserved identifier field of every stored document.
pub const DOC_ID: &str = "_id";

/// Separator of embedded field paths (`"address.city"`).
pub const FIELD_SEPARATOR: &str = ".";

/// Scope key prefix under which repository operators are cached.
pub const REPOSITORY_KEY_PREFIX: &str = "tether.repository.";

/// Scope key of the scope-affine store session.
pub const SESSION_KEY: &str = "tether.session";

/// Scope key of the outcome of the most recent multi-document save.
pub const CHANGE_OUTCOME_KEY: &str = "tether.change_outcome";

pub const DEFAULT_SERVER: &str = "localhost";
pub const DEFAULT_DATABASE: &str = "test";
