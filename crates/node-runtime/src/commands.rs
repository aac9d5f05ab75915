//! # Command Surface
//!
//! Operator commands that publish exactly one event each:
//!
//! ```text
//! block   --author A --recipient R    → blocked-users (key=A)
//! unblock --author A --recipient R    → blocked-users (key=A)
//! deny    --word W                    → deny-words    (key=W)
//! permit  --word W                    → deny-words    (key=W)
//! ```
//!
//! Commands are validated before anything is published. Nothing here
//! checks who is allowed to issue them.

use clap::{Parser, Subcommand};
use shared_bus::{EventLog, LogError, RecordPosition};
use shared_types::topics::{BLOCKED_USERS, DENY_WORDS, MESSAGES};
use shared_types::{CensorEvent, CodecError, Message, RelationshipEvent, UserId};
use std::sync::Arc;
use sv_01_event_codec::{Codec, JsonCodec};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0} must be a non-zero user id")]
    ZeroId(&'static str),

    #[error("User {0} cannot block or unblock themselves")]
    SelfTarget(i64),

    #[error("Word must not be empty")]
    EmptyWord,

    #[error("Word {0:?} must not contain whitespace")]
    WhitespaceInWord(String),

    #[error("{0}")]
    Parse(String),

    #[error("Encoding failed: {0}")]
    Codec(#[from] CodecError),

    #[error("Publish failed: {0}")]
    Log(#[from] LogError),
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Drop messages AUTHOR sends to RECIPIENT.
    Block {
        #[arg(long)]
        author: i64,
        #[arg(long)]
        recipient: i64,
    },
    /// Deliver messages AUTHOR sends to RECIPIENT again.
    Unblock {
        #[arg(long)]
        author: i64,
        #[arg(long)]
        recipient: i64,
    },
    /// Redact WORD from now on.
    Deny {
        #[arg(long)]
        word: String,
    },
    /// Stop redacting WORD.
    Permit {
        #[arg(long)]
        word: String,
    },
}

/// One console line.
#[derive(Debug, Parser)]
#[command(name = "sieve", no_binary_name = true, disable_help_flag = true)]
struct CommandLine {
    #[command(subcommand)]
    command: Command,
}

/// A validated event, ready to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    Relationship(RelationshipEvent),
    Censor(CensorEvent),
}

impl Command {
    /// Parse a console line such as `block --author 1 --recipient 2`.
    pub fn parse_line(line: &str) -> Result<Self, CommandError> {
        CommandLine::try_parse_from(line.split_whitespace())
            .map(|parsed| parsed.command)
            .map_err(|e| CommandError::Parse(e.to_string().trim_end().to_string()))
    }

    /// Check the arguments and build the event to publish.
    pub fn validate(&self) -> Result<Emission, CommandError> {
        match self {
            Self::Block { author, recipient } | Self::Unblock { author, recipient } => {
                if *author == 0 {
                    return Err(CommandError::ZeroId("author"));
                }
                if *recipient == 0 {
                    return Err(CommandError::ZeroId("recipient"));
                }
                if author == recipient {
                    return Err(CommandError::SelfTarget(*author));
                }
                let (actor, counterpart) = (UserId(*author), UserId(*recipient));
                Ok(Emission::Relationship(match self {
                    Self::Block { .. } => RelationshipEvent::Block { actor, counterpart },
                    _ => RelationshipEvent::Unblock { actor, counterpart },
                }))
            }
            Self::Deny { word } | Self::Permit { word } => {
                if word.is_empty() {
                    return Err(CommandError::EmptyWord);
                }
                if word.chars().any(char::is_whitespace) {
                    return Err(CommandError::WhitespaceInWord(word.clone()));
                }
                let word = word.clone();
                Ok(Emission::Censor(match self {
                    Self::Deny { .. } => CensorEvent::Deny { word },
                    _ => CensorEvent::Permit { word },
                }))
            }
        }
    }
}

/// Publishes commands and messages onto the input streams.
#[derive(Clone)]
pub struct Emitter {
    log: Arc<dyn EventLog>,
    messages: Arc<dyn Codec<Message>>,
}

impl Emitter {
    /// `messages` encodes outgoing messages, normally the schema-tagged codec.
    pub fn new(log: Arc<dyn EventLog>, messages: Arc<dyn Codec<Message>>) -> Self {
        Self { log, messages }
    }

    /// Validate and publish one command. Returns once the record is appended.
    pub async fn emit(&self, command: &Command) -> Result<RecordPosition, CommandError> {
        match command.validate()? {
            Emission::Relationship(event) => {
                let value = JsonCodec::<RelationshipEvent>::new().encode(&event)?;
                let position = self
                    .log
                    .append(BLOCKED_USERS, &event.routing_key(), value)
                    .await?;
                info!(
                    actor = %event.actor(),
                    counterpart = %event.counterpart(),
                    "Emitted {}",
                    event.kind()
                );
                Ok(position)
            }
            Emission::Censor(event) => {
                let value = JsonCodec::<CensorEvent>::new().encode(&event)?;
                let position = self
                    .log
                    .append(DENY_WORDS, &event.routing_key(), value)
                    .await?;
                info!(word = %event.word(), "Emitted {}", event.kind());
                Ok(position)
            }
        }
    }

    /// Publish a message keyed by its recipient.
    pub async fn emit_message(&self, message: &Message) -> Result<RecordPosition, CommandError> {
        let value = self.messages.encode(message)?;
        Ok(self
            .log
            .append(MESSAGES, &message.inbound_key(), value)
            .await?)
    }
}
