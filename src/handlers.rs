pub mod backup;
pub mod bills;
pub mod categories;
pub mod customers;
pub mod payments;
pub mod products;
pub mod stocks;
