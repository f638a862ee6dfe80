//! Random identifiers handed out by the server.
//!
//! None of these are validated or stored anywhere; they only need to be
//! unique enough for a client to tell records apart.

/// Prefix of every thread identifier.
pub const THREAD_PREFIX: &str = "thread_";

/// Prefix of the identifier given to AI messages in the stream.
pub const COMPLETION_PREFIX: &str = "chatcmpl-";

/// A random lowercase alphanumeric token.
pub fn random_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// A fresh thread identifier, e.g. `thread_3f2a…`.
pub fn thread_id() -> String {
    format!("{}{}", THREAD_PREFIX, random_token())
}

/// A fresh message identifier.
pub fn message_id() -> String {
    random_token()
}

/// A fresh identifier for an AI message, e.g. `chatcmpl-9b1c…`.
pub fn completion_id() -> String {
    format!("{}{}", COMPLETION_PREFIX, random_token())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_id_shape() {
        let id = thread_id();
        assert!(id.starts_with("thread_"));
        let suffix = &id[THREAD_PREFIX.len()..];
        assert!(!suffix.is_empty());
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_ids_are_distinct() {
        assert_ne!(thread_id(), thread_id());
        assert_ne!(message_id(), message_id());
    }

    #[test]
    fn test_completion_id_prefix() {
        assert!(completion_id().starts_with("chatcmpl-"));
    }
}
