pub mod rules;
pub mod validator;

pub use rules::{GameBundle, ValidationRule};
pub use validator::{quality_score, Validator};
