#[macro_use]
extern crate custom_error;
#[macro_use]
extern crate lazy_static;

pub mod models;
pub mod script;
