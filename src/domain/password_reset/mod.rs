pub mod model;

pub use model::{generate_reset_token, PasswordResetToken, RESET_TOKEN_BYTES};
