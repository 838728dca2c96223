pub mod answer;
pub mod personality_test_answer;
pub mod test;
pub mod token;
