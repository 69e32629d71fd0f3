pub mod dto;
pub mod error;
pub mod record;
pub mod record_filter;
pub mod role;
pub mod token_claim;
pub mod user;
pub use error::Error;
pub use record::{Record, RecordWithUser, UserRecordCount};
pub use record_filter::{Month, RecordFilter, Scope};
pub use role::Role;
pub use token_claim::TokenClaim;
pub use user::User;
