// Promo codes: definition and usability rule. Usage counting lives in the
// ledger, which owns the atomic counter.

pub mod value_objects;

pub use value_objects::*;
