pub mod admin_auth_controller;
pub mod admin_controller;
pub mod bet_controller;
pub mod category_controller;
pub mod odd_controller;
pub mod vote_controller;
