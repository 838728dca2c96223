pub mod admin;
pub mod answers;
pub mod health;
pub mod test_routes;
