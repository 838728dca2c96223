pub mod answer_service;
pub mod test_service;
pub mod token_service;
