pub mod cart;
pub mod stream;
pub mod system;
