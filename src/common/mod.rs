#[macro_use]
pub mod int_like;
