//! Pure relationship transitions.

pub mod transitions;

pub use transitions::apply;
