//! Selection persistence module.
//!
//! Forms remember their field values between runs of the application through two
//! pieces:
//! - [`SelectionStore`]: a JSON-backed dictionary keyed by form identifier,
//!   rewritten in full on every mutation.
//! - [`save_selection`] / [`restore_selection`]: helpers that move values between
//!   a store entry and a set of widgets implementing the [`FormField`] contract,
//!   skipping individual fields that cannot be read or restored.

pub mod form;
pub mod store;

pub use form::{FormField, restore_selection, save_selection};
pub use store::{FieldValues, SelectionStore};
