//! Type-safe cache key builders

use std::fmt;

pub const VERSION: &str = "v1";

pub mod telegram {
    use super::*;

    pub const NAMESPACE: &str = "telegram";

    /// Set of chat ids that have already received the welcome message
    #[derive(Debug, Clone, Default)]
    pub struct JoinedUsersKey;

    impl fmt::Display for JoinedUsersKey {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}:{}:joined_users", VERSION, NAMESPACE)
        }
    }
}
