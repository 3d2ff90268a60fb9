pub mod audit;
pub mod config;
pub mod consistency;
pub mod construction;
pub mod customers;
pub mod drawings;
pub mod error;
pub mod estimates;
pub mod lifecycle;
pub mod production;
pub mod projects;
pub mod stats;
