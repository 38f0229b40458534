//! Server wire types (§6). `LoginReply` is intentionally permissive on
//! deserialize — unknown fields are dropped by `serde_json`'s default
//! behavior — because the only thing allowed to trust a `LoginReply` field is
//! the explicit allowlist in `reply_reconciler` (§4.4, §9 "server-trust
//! boundary").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::envelope::{EdgeBox, EdgeSnrp};

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginReply {
    #[serde(default)]
    pub app_id: String,
    pub login_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp_reset_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp_timeout: Option<i64>,

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

    /// Sent once by the server after a pin2/recovery2 setup kit; the
    /// reconciler decrypts these and persists the *result*, never the box
    /// itself (§4.4 steps 3-4).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin2_key_box: Option<EdgeBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery2_key_box: Option<EdgeBox>,

    #[serde(default)]
    pub key_boxes: Vec<EdgeBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mnemonic_box: Option<EdgeBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_key_box: Option<EdgeBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_key_box: Option<EdgeBox>,

    #[serde(default)]
    pub children: Vec<LoginReply>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesPayload {
    pub messages: Vec<LoginMessage>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginMessage {
    pub login_id: String,
    #[serde(default)]
    pub otp_reset_pending: bool,
    #[serde(default)]
    pub pending_vouchers: Vec<String>,
    #[serde(default)]
    pub recovery2_corrupt: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesRequest {
    pub login_ids: Vec<String>,
}
