//! Login tree builder (§4.3): decrypts a stash tree into an in-memory login
//! tree, deriving child keys from parent keys as it recurses.

use chrono::Utc;

use crate::crypto::{codecs, envelope};
use crate::error::{Error, ErrorKind};
use crate::tree_engine;
use crate::types::stash::LoginStash;
use crate::types::tree::LoginTree;
use crate::types::wallet_info::{merge_wallet_infos, EdgeWalletInfo};

/// Locates the stash node with `app_id` and decrypts that subtree. Nodes
/// outside the target subtree are returned with only identity fields
/// (§4.3 "outer clone").
pub fn make_login_tree(stash_tree: &LoginStash, login_key: &[u8], app_id: &str) -> Result<LoginTree, Error> {
    let target = tree_engine::search(stash_tree, &|n: &LoginStash| n.app_id == app_id)
        .ok_or_else(|| ErrorKind::MissingLogin(app_id.to_string()))?;
    let decrypted = make_login_tree_inner(target, login_key)?;
    Ok(project_outer(stash_tree, app_id, decrypted))
}

/// Rebuilds `stash_tree` as a `LoginTree`, replacing the `app_id` subtree
/// with its fully decrypted form and projecting every other node to
/// identity-only fields.
fn project_outer(stash_tree: &LoginStash, app_id: &str, decrypted_target: LoginTree) -> LoginTree {
    fn go(node: &LoginStash, app_id: &str, decrypted_target: &LoginTree) -> LoginTree {
        if node.app_id == app_id {
            return decrypted_target.clone();
        }
        let mut projected = LoginTree {
            app_id: node.app_id.clone(),
            login_id: node.login_id.clone(),
            username: node.username.clone(),
            ..Default::default()
        };
        projected.children = node
            .children
            .iter()
            .map(|c| go(c, app_id, decrypted_target))
            .collect();
        projected
    }
    go(stash_tree, app_id, &decrypted_target)
}

fn accounttype(app_id: &str) -> String {
    if app_id.is_empty() {
        "account-repo:co.airbitz.wallet".to_string()
    } else {
        format!("account-repo:{app_id}")
    }
}

/// §4.3 steps 1-11, applied to one stash node plus the key that decrypts it.
/// The `children` are recursed into using keys obtained from each child's
/// `parentBox`.
pub fn make_login_tree_inner(stash: &LoginStash, login_key: &[u8]) -> Result<LoginTree, Error> {
    let mut tree = LoginTree {
        app_id: stash.app_id.clone(),
        created: stash.created,
        last_login: Some(stash.last_login.unwrap_or_else(Utc::now)),
        login_id: stash.login_id.clone(),
        otp_key: stash.otp_key.clone(),
        otp_reset_date: stash.otp_reset_date,
        otp_timeout: stash.otp_timeout,
        user_id: stash.user_id.clone(),
        username: stash.username.clone(),
        login_key: login_key.to_vec(),
        ..Default::default()
    };

    if let Some(login_auth_box) = &stash.login_auth_box {
        tree.login_auth = Some(envelope::decrypt(login_auth_box, login_key)?);
    }

    if let Some(password_auth_box) = &stash.password_auth_box {
        tree.password_auth = Some(envelope::decrypt(password_auth_box, login_key)?);
        if tree.user_id.is_none() {
            tree.user_id = Some(stash.login_id.clone());
        }
    }

    if !tree.has_auth() {
        return Err(ErrorKind::MissingAuth.into());
    }

    if let Some(pin2_key) = &stash.pin2_key {
        tree.pin2_key = Some(codecs::base64_decode(pin2_key)?);
    }
    if let Some(pin2_text_box) = &stash.pin2_text_box {
        tree.pin = Some(envelope::decrypt_text(pin2_text_box, login_key)?);
    }

    if let Some(recovery2_key) = &stash.recovery2_key {
        tree.recovery2_key = Some(codecs::base64_decode(recovery2_key)?);
    }

    let mut key_infos: Vec<EdgeWalletInfo> = Vec::new();

    // §4.3 step 7: legacy BitID.
    if let (Some(mnemonic_box), Some(root_key_box)) = (&stash.mnemonic_box, &stash.root_key_box) {
        let root_key = envelope::decrypt(root_key_box, login_key)?;
        let info_key = envelope::hmac_sha256(&root_key, b"infoKey");
        let mnemonic = envelope::decrypt_text(mnemonic_box, &info_key)?;
        let mut info = EdgeWalletInfo::new(format!("bitid:{}", stash.login_id), "wallet:bitid");
        info.keys.insert("mnemonic".into(), serde_json::Value::String(mnemonic));
        info.keys
            .insert("rootKey".into(), serde_json::Value::String(codecs::base64_encode(&root_key)));
        key_infos.push(info);
    }

    // §4.3 step 8: account sync.
    if let Some(sync_key_box) = &stash.sync_key_box {
        let sync_key = envelope::decrypt(sync_key_box, login_key)?;
        let mut info = EdgeWalletInfo::new(format!("sync:{}", stash.login_id), accounttype(&stash.app_id));
        info.keys
            .insert("syncKey".into(), serde_json::Value::String(codecs::base64_encode(&sync_key)));
        info.keys
            .insert("dataKey".into(), serde_json::Value::String(codecs::base64_encode(login_key)));
        key_infos.push(info);
    }

    // §4.3 step 9: wallet keys.
    let mut parsed_infos = Vec::with_capacity(stash.key_boxes.len());
    for key_box in &stash.key_boxes {
        let plaintext = envelope::decrypt_text(key_box, login_key)?;
        let value: serde_json::Value = serde_json::from_str(&plaintext)?;
        let info = EdgeWalletInfo::from_json(&value)
            .ok_or_else(|| ErrorKind::KeyIntegrity("keyBox decrypted to a malformed wallet info".into()))?;
        parsed_infos.push(info);
    }

    tree.key_infos = merge_wallet_infos(&key_infos, &parsed_infos);

    // §4.3 step 11: recurse into children.
    let mut children = Vec::with_capacity(stash.children.len());
    for child_stash in &stash.children {
        let parent_box = child_stash
            .parent_box
            .as_ref()
            .ok_or_else(|| ErrorKind::KeyIntegrity(format!("child `{}` has no parentBox", child_stash.app_id)))?;
        let child_key = envelope::decrypt(parent_box, login_key)?;
        children.push(make_login_tree_inner(child_stash, &child_key)?);
    }
    tree.children = children;

    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::codecs;

    fn root_with_password(login_key: &[u8; 32], password_auth: &[u8; 32]) -> LoginStash {
        let mut stash = LoginStash::new_root(codecs::base64_encode(&[1u8; 32]), "edge".to_string());
        stash.password_auth_box = Some(envelope::encrypt(password_auth, login_key));
        stash
    }

    #[test]
    fn missing_auth_is_rejected() {
        let stash = LoginStash::new_root(codecs::base64_encode(&[1u8; 32]), "edge".to_string());
        let err = make_login_tree_inner(&stash, &[0u8; 32]).unwrap_err();
        matches!(err.into_kind(), crate::error::ErrorKind::MissingAuth);
    }

    #[test]
    fn password_auth_decrypts_and_defaults_user_id() {
        let login_key = [3u8; 32];
        let password_auth = [4u8; 32];
        let stash = root_with_password(&login_key, &password_auth);
        let tree = make_login_tree_inner(&stash, &login_key).unwrap();
        assert_eq!(tree.password_auth.as_deref(), Some(&password_auth[..]));
        assert_eq!(tree.user_id.as_deref(), Some(stash.login_id.as_str()));
    }

    #[test]
    fn child_without_parent_box_is_key_integrity_error() {
        let login_key = [3u8; 32];
        let mut stash = root_with_password(&login_key, &[4u8; 32]);
        let mut child = LoginStash::default();
        child.app_id = "app.a".to_string();
        child.login_id = codecs::base64_encode(&[2u8; 32]);
        child.password_auth_box = Some(envelope::encrypt(&[5u8; 32], &login_key));
        stash.children.push(child);

        let err = make_login_tree_inner(&stash, &login_key).unwrap_err();
        matches!(err.into_kind(), crate::error::ErrorKind::KeyIntegrity(_));
    }

    #[test]
    fn outer_projection_hides_sibling_secrets() {
        let login_key = [3u8; 32];
        let mut root = root_with_password(&login_key, &[4u8; 32]);

        let mut app_a = LoginStash::default();
        app_a.app_id = "app.a".to_string();
        app_a.login_id = codecs::base64_encode(&[2u8; 32]);
        let child_key_a = [9u8; 32];
        app_a.parent_box = Some(envelope::encrypt(&child_key_a, &login_key));
        app_a.password_auth_box = Some(envelope::encrypt(&[6u8; 32], &child_key_a));

        root.children.push(app_a);

        let tree = make_login_tree(&root, &login_key, "").unwrap();
        assert!(tree.password_auth.is_some());
        assert!(tree.children[0].password_auth.is_none());
        assert_eq!(tree.children[0].app_id, "app.a");
    }
}
