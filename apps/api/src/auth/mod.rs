// Accounts: password hashing, bearer tokens, and the request extractor that
// turns a token into the caller's identity. Handlers never authenticate
// on their own; they take an `AuthUser`.

pub mod extractor;
pub mod handlers;
pub mod password;
pub mod token;

pub use extractor::AuthUser;
