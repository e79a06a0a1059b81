pub mod reading;
pub mod registry;
pub mod value;
