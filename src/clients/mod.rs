pub mod identity;
pub mod postgrest;

pub use identity::{DevIdentityProvider, IdentityProvider, Principal, SupabaseIdentityProvider};
pub use postgrest::PostgrestStore;
