pub mod clock;
pub mod signature;
