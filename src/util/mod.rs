pub mod links;
pub mod validation;
