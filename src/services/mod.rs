pub mod sniff;
pub mod staging;
pub mod upload;
