pub mod capture;
pub mod kit;
