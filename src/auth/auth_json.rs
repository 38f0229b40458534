//! `makeAuthJson`/`getStashOtp` (§4.5): the request body fragment identifying
//! who is calling, and the one-time code attached to it.

use serde_json::{json, Value};

use crate::crypto::{codecs, hotp};
use crate::error::{Error, ErrorKind};
use crate::types::stash::LoginStash;
use crate::types::tree::LoginTree;

/// User-supplied OTP inputs, e.g. from a login form's "enter your 6-digit
/// code" field.
#[derive(Clone, Debug, Default)]
pub struct LoginOtpOptions {
    pub otp: Option<String>,
    pub otp_key: Option<String>,
}

/// §4.5 `getStashOtp`: a short digit string is a user-typed code and passes
/// through verbatim; anything longer is treated as a base32 secret to derive
/// a TOTP from.
pub fn get_stash_otp(stash: &LoginStash, opts: &LoginOtpOptions) -> Result<Option<String>, Error> {
    if let Some(otp) = &opts.otp {
        if otp.len() < 16 && otp.chars().all(|c| c.is_ascii_digit()) {
            return Ok(Some(otp.clone()));
        }
        return hotp::totp(otp).map(Some);
    }
    if let Some(key) = opts.otp_key.as_ref().or(stash.otp_key.as_ref()) {
        return hotp::totp(key).map(Some);
    }
    Ok(None)
}

/// §4.5 `makeAuthJson`: prefers `loginAuth` over `passwordAuth`, and fails
/// with `NoAuth` when the node carries neither. The OTP is derived from
/// `login.otp_key` the same way `getStashOtp` derives it from a stash; there
/// is no separate otp parameter for a caller to forget to pass. The `otp`
/// key is left out of the object entirely when there's nothing to attach,
/// rather than serialized as `null`.
pub fn make_auth_json(login: &LoginTree) -> Result<Value, Error> {
    let otp = login.otp_key.as_ref().map(|key| hotp::totp(key)).transpose()?;

    let mut auth = if let Some(login_auth) = &login.login_auth {
        json!({
            "loginId": login.login_id,
            "loginAuth": codecs::base64_encode(login_auth),
        })
    } else if let Some(password_auth) = &login.password_auth {
        let user_id = login.user_id.clone().ok_or_else(|| ErrorKind::NoAuth)?;
        json!({
            "userId": user_id,
            "passwordAuth": codecs::base64_encode(password_auth),
        })
    } else {
        return Err(ErrorKind::NoAuth.into());
    };

    if let Some(otp) = otp {
        auth["otp"] = Value::String(otp);
    }
    Ok(auth)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_digit_otp_passes_through_verbatim() {
        let stash = LoginStash::default();
        let opts = LoginOtpOptions {
            otp: Some("123456".to_string()),
            otp_key: None,
        };
        assert_eq!(get_stash_otp(&stash, &opts).unwrap(), Some("123456".to_string()));
    }

    #[test]
    fn missing_otp_everywhere_is_unset() {
        let stash = LoginStash::default();
        let opts = LoginOtpOptions::default();
        assert_eq!(get_stash_otp(&stash, &opts).unwrap(), None);
    }

    #[test]
    fn auth_json_prefers_login_auth_over_password_auth() {
        let mut tree = LoginTree::default();
        tree.login_id = "bG9naW4".to_string();
        tree.login_auth = Some(vec![1, 2, 3]);
        tree.password_auth = Some(vec![4, 5, 6]);

        let auth = make_auth_json(&tree).unwrap();
        assert!(auth.get("loginAuth").is_some());
        assert!(auth.get("passwordAuth").is_none());
    }

    #[test]
    fn auth_json_without_either_secret_is_no_auth() {
        let tree = LoginTree::default();
        let err = make_auth_json(&tree).unwrap_err();
        matches!(err.into_kind(), crate::error::ErrorKind::NoAuth);
    }

    #[test]
    fn auth_json_omits_otp_key_when_node_has_no_otp_key() {
        let mut tree = LoginTree::default();
        tree.login_id = "bG9naW4".to_string();
        tree.login_auth = Some(vec![1, 2, 3]);

        let auth = make_auth_json(&tree).unwrap();
        assert!(auth.get("otp").is_none());
    }

    #[test]
    fn auth_json_attaches_totp_when_node_has_otp_key() {
        let mut tree = LoginTree::default();
        tree.login_id = "bG9naW4".to_string();
        tree.login_auth = Some(vec![1, 2, 3]);
        tree.otp_key = Some(codecs::base32_encode(&[1u8; 10]));

        let auth = make_auth_json(&tree).unwrap();
        let otp = auth.get("otp").unwrap().as_str().unwrap();
        assert_eq!(otp.len(), 6);
        assert!(otp.chars().all(|c| c.is_ascii_digit()));
    }
}
