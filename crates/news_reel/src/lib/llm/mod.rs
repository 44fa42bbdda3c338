pub mod composer;
pub mod openai;
