//! `LoginTree` — the in-memory mirror of `LoginStash` with secrets decrypted
//! (§3). Produced only by `login_tree_builder::make_login_tree` and discarded
//! on logout; never serialized to disk.

use chrono::{DateTime, Utc};

use crate::tree_engine::TreeNode;
use crate::types::wallet_info::EdgeWalletInfo;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoginTree {
    pub app_id: String,
    pub login_id: String,
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,

    pub otp_key: Option<String>,
    pub otp_reset_date: Option<DateTime<Utc>>,
    pub otp_timeout: Option<i64>,

    /// 32-byte symmetric key decrypting this node's boxes.
    pub login_key: Vec<u8>,
    pub login_auth: Option<Vec<u8>>,
    pub password_auth: Option<Vec<u8>>,
    pub pin: Option<String>,
    pub pin2_key: Option<Vec<u8>>,
    pub recovery2_key: Option<Vec<u8>>,

    pub key_infos: Vec<EdgeWalletInfo>,

    pub children: Vec<LoginTree>,
}

impl LoginTree {
    /// §3 invariant 4: at least one of loginAuth/passwordAuth must be set for
    /// a node that is used to authenticate to the server.
    pub fn has_auth(&self) -> bool {
        self.login_auth.is_some() || self.password_auth.is_some()
    }

    pub fn find_by_login_id(&self, login_id: &str) -> Option<&LoginTree> {
        crate::tree_engine::search(self, &|n| n.login_id == login_id)
    }
}

impl TreeNode for LoginTree {
    fn children(&self) -> &[Self] {
        &self.children
    }

    fn with_children(mut self, children: Vec<Self>) -> Self {
        self.children = children;
        self
    }

    fn outer_clone(&self) -> Self {
        LoginTree {
            app_id: self.app_id.clone(),
            login_id: self.login_id.clone(),
            username: self.username.clone(),
            children: Vec::new(),
            ..Default::default()
        }
    }
}
