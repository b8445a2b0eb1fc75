pub mod mime;
pub mod store;
