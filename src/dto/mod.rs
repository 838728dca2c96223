pub mod answer_dto;
pub mod test_dto;
pub mod token_dto;
