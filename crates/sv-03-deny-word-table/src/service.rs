//! # Deny-Word Table Service

use crate::domain;
use shared_bus::{EventLog, StatefulHandler, TableGroup, TableStorage, Transition, KEY_MISMATCH};
use shared_types::topics::{DENY_WORDS, DENY_WORD_GROUP};
use shared_types::{CensorEvent, CensorState, ProcessorId};
use std::sync::Arc;
use sv_01_event_codec::JsonCodec;

/// Stateful handler of the `deny-words` stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyWordProcessor;

impl StatefulHandler for DenyWordProcessor {
    type Event = CensorEvent;
    type State = CensorState;

    fn processor(&self) -> ProcessorId {
        ProcessorId::DenyWordTable
    }

    fn admit(&self, key: &str, event: &CensorEvent) -> Result<(), &'static str> {
        if event.word() != key {
            return Err(KEY_MISMATCH);
        }
        Ok(())
    }

    fn apply(&self, current: Option<&CensorState>, event: &CensorEvent) -> Transition<CensorState> {
        domain::apply(current, event)
    }
}

/// The deny-word table group, consuming `deny-words`.
#[must_use]
pub fn deny_word_group(
    log: Arc<dyn EventLog>,
    storage: Arc<dyn TableStorage>,
) -> TableGroup<DenyWordProcessor> {
    TableGroup::new(
        DenyWordProcessor,
        DENY_WORD_GROUP,
        DENY_WORDS,
        log,
        storage,
        Arc::new(JsonCodec::<CensorEvent>::new()),
        Arc::new(JsonCodec::<CensorState>::new()),
    )
}
