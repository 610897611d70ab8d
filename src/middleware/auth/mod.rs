pub mod access;
pub mod unauthorized;
