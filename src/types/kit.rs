//! `LoginKit` — a mutation bundle applied atomically-per-node by
//! `auth::kit::apply_kit` (§4.5).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::envelope::EdgeBox;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerMethod {
    Post,
    Delete,
}

impl Default for ServerMethod {
    fn default() -> Self {
        ServerMethod::Post
    }
}

impl ServerMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerMethod::Post => "POST",
            ServerMethod::Delete => "DELETE",
        }
    }
}

/// Partial `LoginStash` delta carried by a kit. Every field is optional;
/// `None` means "leave the stash's current value alone".
#[derive(Clone, Debug, Default)]
pub struct StashDelta {
    pub otp_key: Option<Option<String>>,
    pub otp_reset_date: Option<Option<chrono::DateTime<chrono::Utc>>>,
    pub otp_timeout: Option<Option<i64>>,
    pub password_auth_box: Option<EdgeBox>,
    pub password_auth_snrp: Option<crate::types::envelope::EdgeSnrp>,
    pub password_box: Option<EdgeBox>,
    pub password_key_snrp: Option<crate::types::envelope::EdgeSnrp>,
    pub pin2_text_box: Option<EdgeBox>,
    pub key_boxes: Vec<EdgeBox>,
    pub children: Vec<crate::types::stash::LoginStash>,
}

/// Partial `LoginTree` delta carried by a kit.
#[derive(Clone, Debug, Default)]
pub struct LoginDelta {
    pub otp_key: Option<Option<String>>,
    pub otp_reset_date: Option<Option<chrono::DateTime<chrono::Utc>>>,
    pub otp_timeout: Option<Option<i64>>,
    pub password_auth: Option<Vec<u8>>,
    pub pin: Option<Option<String>>,
    pub key_infos: Vec<crate::types::wallet_info::EdgeWalletInfo>,
    pub children: Vec<crate::types::tree::LoginTree>,
}

#[derive(Clone, Debug)]
pub struct LoginKit {
    pub login_id: String,
    pub server_method: ServerMethod,
    pub server_path: String,
    pub server: Option<Value>,
    pub stash: StashDelta,
    pub login: LoginDelta,
}
