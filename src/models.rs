pub mod backup;
pub mod billing;
pub mod catalog;
pub mod stock;
