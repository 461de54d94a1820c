//! Common types used across the application.

pub mod id;
pub mod money;
pub mod pagination;

pub use id::*;
pub use money::{MAX_AMOUNT, format_amount, is_cent_precise, is_storable, round_to_cents};
pub use pagination::{PageMeta, PageRequest, PageResponse};
