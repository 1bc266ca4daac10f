pub mod auth;
pub mod error;
pub mod quiz;
pub mod terms;
pub mod vocabulary;
