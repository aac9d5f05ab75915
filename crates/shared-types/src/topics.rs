//! # Stream Names
//!
//! Topic and consumer-group names shared by every processor. A table's
//! changelog topic is its owning group name plus `-table`.

/// Block/unblock events, keyed by actor.
pub const BLOCKED_USERS: &str = "blocked-users";

/// Deny/permit events, keyed by word.
pub const DENY_WORDS: &str = "deny-words";

/// Messages as emitted, keyed by recipient.
pub const MESSAGES: &str = "messages";

/// Messages re-keyed by sender, consumed by the filter.
pub const MESSAGES_BY_SENDER: &str = "messages-by-sender";

/// Filter output, keyed like its input.
pub const FILTERED_MESSAGES: &str = "filtered-messages";

/// Group owning the relationship table.
pub const RELATIONSHIP_GROUP: &str = BLOCKED_USERS;

/// Group owning the deny-word table.
pub const DENY_WORD_GROUP: &str = DENY_WORDS;

/// Group of the sender re-keying stage.
pub const REKEY_GROUP: &str = "messages-rekey";

/// Group of the message filter.
pub const FILTER_GROUP: &str = "message-filter";

/// Every non-changelog topic, created at startup with the configured
/// partition count.
pub const STREAM_TOPICS: [&str; 5] = [
    BLOCKED_USERS,
    DENY_WORDS,
    MESSAGES,
    MESSAGES_BY_SENDER,
    FILTERED_MESSAGES,
];
