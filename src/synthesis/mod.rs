pub mod sampling;
pub mod session;
