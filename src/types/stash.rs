//! `LoginStash` — the on-disk, still-encrypted representation of a login tree
//! (§3). Every non-identity field is either an `EdgeBox` or plaintext derived
//! key material that was already decrypted once from a server-sent box
//! (`pin2Key`, `recovery2Key` — see §4.4 steps 3-4).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tree_engine::TreeNode;
use crate::types::envelope::{EdgeBox, EdgeSnrp};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginStash {
    #[serde(default)]
    pub app_id: String,
    pub login_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp_reset_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp_timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voucher_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voucher_auth: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_auth_box: Option<EdgeBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_box: Option<EdgeBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_auth_box: Option<EdgeBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_auth_snrp: Option<EdgeSnrp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_box: Option<EdgeBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_key_snrp: Option<EdgeSnrp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin2_text_box: Option<EdgeBox>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin2_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery2_key: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_boxes: Vec<EdgeBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mnemonic_box: Option<EdgeBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_key_box: Option<EdgeBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_key_box: Option<EdgeBox>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LoginStash>,
}

impl LoginStash {
    pub fn new_root(login_id: String, username: String) -> Self {
        LoginStash {
            app_id: String::new(),
            login_id,
            username: Some(username),
            created: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// §3 invariant 7: only a root stash with a well-formed 32-byte loginId
    /// and a username may be saved.
    pub fn validate_for_save(&self) -> Result<(), crate::error::Error> {
        use crate::error::ErrorKind;
        if self.app_id != "" {
            return Err(ErrorKind::InvalidStash("stash to save must be the root (appId == \"\")".into()).into());
        }
        if self.login_id.is_empty() {
            return Err(ErrorKind::InvalidStash("stash to save must have a loginId".into()).into());
        }
        let decoded = crate::crypto::codecs::base64_decode(&self.login_id)
            .map_err(|_| ErrorKind::InvalidStash("loginId is not valid base64".to_string()))?;
        if decoded.len() != 32 {
            return Err(ErrorKind::InvalidStash(format!(
                "loginId must decode to 32 bytes, got {}",
                decoded.len()
            ))
            .into());
        }
        match &self.username {
            Some(u) if !u.is_empty() => {}
            _ => return Err(ErrorKind::InvalidStash("stash to save must have a username".into()).into()),
        }
        Ok(())
    }
}

impl TreeNode for LoginStash {
    fn children(&self) -> &[Self] {
        &self.children
    }

    fn with_children(mut self, children: Vec<Self>) -> Self {
        self.children = children;
        self
    }

    /// "Outer clone": nodes outside the appId a caller is operating on are
    /// reduced to identity-only fields (§4.3, §4.5 sanitize).
    fn outer_clone(&self) -> Self {
        LoginStash {
            app_id: self.app_id.clone(),
            login_id: self.login_id.clone(),
            username: self.username.clone(),
            children: Vec::new(),
            ..Default::default()
        }
    }
}
