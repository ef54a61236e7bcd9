pub mod store;
pub mod utils;
pub mod viewer;
