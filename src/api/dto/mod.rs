//! Data Transfer Objects for REST request/response serialization.
//!
//! Keys are camelCase on the wire; documents pass through untouched.

pub mod alert_dto;
pub mod common_dto;
pub mod document_dto;

pub use alert_dto::*;
pub use common_dto::*;
pub use document_dto::*;
