mod api;
mod filter;
mod types;

pub use api::ItemsApi;
pub use filter::{ItemFilter, StatusFilter};
pub use types::{Item, ItemDraft, ItemIdGenerator};
