//! Client-side login tree engine for the Edge account login subsystem: the
//! hierarchical, end-to-end encrypted credential store shared by password,
//! PIN, recovery, and return logins.
//!
//! This crate owns everything between "the user typed a password" and "here
//! is a decrypted `LoginTree`": the on-disk stash format, the server sync
//! protocol, the crypto primitives, and the tree merge/decrypt/sanitize
//! operations that sit between them. It has no UI and no knowledge of any
//! particular wallet plugin's key material beyond `EdgeWalletInfo`'s opaque
//! `keys` blob.

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod events;
pub mod login_tree_builder;
pub mod reply_reconciler;
pub mod server;
pub mod stash_store;
pub mod tree_engine;
pub mod types;

pub use config::LoginCoreConfig;
pub use error::{Error, ErrorKind, Result};
pub use events::{LoginCoreEvent, Publisher};
pub use login_tree_builder::{make_login_tree, make_login_tree_inner};
pub use reply_reconciler::apply_login_reply;
pub use stash_store::{Disklet, FsDisklet, StashStore};
pub use types::{EdgeBox, EdgeSnrp, EdgeWalletInfo, LoginKit, LoginReply, LoginStash, LoginTree, ServerMethod};
