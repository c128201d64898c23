pub mod error;
pub mod reconcile;
pub mod repo;
pub mod service;
pub mod shopping_list;
pub mod validation;
