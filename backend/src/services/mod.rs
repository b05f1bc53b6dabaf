pub mod authenticator;
pub mod session_store;
pub mod session_sweeper;
pub mod token_codec;
