//! Pure deny-word transitions.

pub mod transitions;

pub use transitions::apply;
