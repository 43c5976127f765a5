pub mod admin_service;
pub mod bet_lifecycle;
pub mod bet_service;
pub mod category_service;
pub mod vote_aggregator;
