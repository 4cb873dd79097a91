pub mod catalog;
pub mod fits;
pub mod store;
