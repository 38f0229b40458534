pub mod envelope;
pub mod kit;
pub mod reply;
pub mod stash;
pub mod tree;
pub mod wallet_info;

pub use envelope::{EdgeBox, EdgeSnrp};
pub use kit::{LoginKit, ServerMethod};
pub use reply::{LoginReply, MessagesPayload};
pub use stash::LoginStash;
pub use tree::LoginTree;
pub use wallet_info::EdgeWalletInfo;
