pub mod method;
pub mod register;
pub mod score;
pub mod wizard;
