pub mod credential;
pub mod token;

pub use credential::SplitCredential;
pub use token::{TokenError, mint_token, unix_now};
