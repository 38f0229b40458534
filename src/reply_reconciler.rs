//! Reply reconciler (§4.4): merges an untrusted `LoginReply` into the
//! previous on-disk `LoginStash`, one field at a time through an explicit
//! allowlist. Nothing from `LoginReply` reaches the new stash except through
//! a named assignment in this file (§9 "server-trust boundary").

use crate::crypto::{codecs, envelope};
use crate::error::{Error, ErrorKind};
use crate::tree_engine;
use crate::types::reply::LoginReply;
use crate::types::stash::LoginStash;

/// Merges `reply` into `previous` — the on-disk tree as it was before this
/// round — and returns the *whole* tree with the reconciled node spliced
/// back in. `previous` may be `None` for a brand-new login_id with no prior
/// stash at all; otherwise `reply.loginId` is located anywhere in
/// `previous` (it need not be the tree root — a sync scoped to one app
/// reconciles only that subtree) and every sibling is left untouched.
pub fn apply_login_reply(
    previous: Option<&LoginStash>,
    reply: &LoginReply,
    login_key: &[u8],
) -> Result<LoginStash, Error> {
    let previous_tree = match previous {
        None => return apply_login_reply_inner(None, reply, login_key),
        Some(p) => p,
    };

    if previous_tree.login_id == reply.login_id {
        return apply_login_reply_inner(Some(previous_tree), reply, login_key);
    }

    let matched = tree_engine::search(previous_tree, &|n: &LoginStash| n.login_id == reply.login_id)
        .ok_or_else(|| ErrorKind::MissingLogin(reply.login_id.clone()))?;
    let reconciled = apply_login_reply_inner(Some(matched), reply, login_key)?;

    Ok(tree_engine::update(
        previous_tree,
        &|n: &LoginStash| n.login_id == reply.login_id,
        &|_| reconciled.clone(),
    ))
}

fn apply_login_reply_inner(
    previous: Option<&LoginStash>,
    reply: &LoginReply,
    login_key: &[u8],
) -> Result<LoginStash, Error> {
    let mut stash = LoginStash {
        app_id: reply.app_id.clone(),
        login_id: reply.login_id.clone(),
        user_id: reply.user_id.clone(),
        created: reply.created,
        otp_key: reply.otp_key.clone(),
        otp_reset_date: reply.otp_reset_date,
        otp_timeout: reply.otp_timeout,

        login_auth_box: reply.login_auth_box.clone(),
        parent_box: reply.parent_box.clone(),
        password_auth_box: reply.password_auth_box.clone(),
        password_auth_snrp: reply.password_auth_snrp.clone(),
        password_box: reply.password_box.clone(),
        password_key_snrp: reply.password_key_snrp.clone(),
        pin2_text_box: reply.pin2_text_box.clone(),

        key_boxes: reply.key_boxes.clone(),
        mnemonic_box: reply.mnemonic_box.clone(),
        root_key_box: reply.root_key_box.clone(),
        sync_key_box: reply.sync_key_box.clone(),

        ..Default::default()
    };

    // §4.4 steps: lastLogin/username/userId are carried forward from the
    // previous stash, never taken from the reply.
    if let Some(prev) = previous {
        stash.last_login = prev.last_login;
        stash.username = prev.username.clone();
        if stash.user_id.is_none() {
            stash.user_id = prev.user_id.clone();
        }
    }

    // §4.4 steps 3-4: the server only ever sends the pin2/recovery2 *box*
    // once, at setup time. Decrypt it now and persist the plaintext key,
    // never the box.
    if let Some(pin2_key_box) = &reply.pin2_key_box {
        let pin2_key = envelope::decrypt(pin2_key_box, login_key)?;
        stash.pin2_key = Some(codecs::base64_encode(&pin2_key));
    } else if let Some(prev) = previous {
        stash.pin2_key = prev.pin2_key.clone();
    }

    if let Some(recovery2_key_box) = &reply.recovery2_key_box {
        let recovery2_key = envelope::decrypt(recovery2_key_box, login_key)?;
        stash.recovery2_key = Some(codecs::base64_encode(&recovery2_key));
    } else if let Some(prev) = previous {
        stash.recovery2_key = prev.recovery2_key.clone();
    }

    let prev_children = previous.map(|p| p.children.as_slice()).unwrap_or(&[]);
    if prev_children.len() > reply.children.len() {
        return Err(ErrorKind::ServerLostChildren {
            app_id: stash.app_id.clone(),
            stash_children: prev_children.len(),
            reply_children: reply.children.len(),
        }
        .into());
    }

    let mut children = Vec::with_capacity(reply.children.len());
    for (index, reply_child) in reply.children.iter().enumerate() {
        let parent_box = reply_child
            .parent_box
            .as_ref()
            .ok_or_else(|| ErrorKind::KeyIntegrity(format!("reply child `{}` has no parentBox", reply_child.app_id)))?;
        let child_key = envelope::decrypt(parent_box, login_key)?;
        let prev_child = prev_children.get(index);
        children.push(apply_login_reply_inner(prev_child, reply_child, &child_key)?);
    }
    stash.children = children;

    Ok(stash)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_reply(login_id: &str) -> LoginReply {
        LoginReply {
            login_id: login_id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn fresh_login_has_no_previous_username_to_carry() {
        let reply = minimal_reply("abc");
        let stash = apply_login_reply(None, &reply, &[0u8; 32]).unwrap();
        assert_eq!(stash.username, None);
        assert_eq!(stash.login_id, "abc");
    }

    #[test]
    fn username_and_last_login_survive_from_previous_stash() {
        let mut prev = LoginStash::new_root(codecs::base64_encode(&[1u8; 32]), "alice".to_string());
        prev.last_login = prev.created;
        let reply = minimal_reply(&prev.login_id);
        let stash = apply_login_reply(Some(&prev), &reply, &[0u8; 32]).unwrap();
        assert_eq!(stash.username.as_deref(), Some("alice"));
        assert_eq!(stash.last_login, prev.last_login);
    }

    #[test]
    fn pin2_key_box_is_decrypted_and_not_retained_as_a_box() {
        let login_key = [5u8; 32];
        let pin2_key = [9u8; 32];
        let mut reply = minimal_reply("abc");
        reply.pin2_key_box = Some(envelope::encrypt(&pin2_key, &login_key));

        let stash = apply_login_reply(None, &reply, &login_key).unwrap();
        assert_eq!(stash.pin2_key, Some(codecs::base64_encode(&pin2_key)));
    }

    #[test]
    fn fewer_reply_children_than_stash_children_is_rejected() {
        let login_key = [5u8; 32];
        let mut prev = LoginStash::new_root(codecs::base64_encode(&[1u8; 32]), "alice".to_string());
        prev.children.push(LoginStash::default());
        let reply = minimal_reply(&prev.login_id);

        let err = apply_login_reply(Some(&prev), &reply, &login_key).unwrap_err();
        matches!(err.into_kind(), crate::error::ErrorKind::ServerLostChildren { .. });
    }

    #[test]
    fn child_without_parent_box_is_rejected() {
        let login_key = [5u8; 32];
        let mut reply = minimal_reply("abc");
        reply.children.push(minimal_reply("child"));

        let err = apply_login_reply(None, &reply, &login_key).unwrap_err();
        matches!(err.into_kind(), crate::error::ErrorKind::KeyIntegrity(_));
    }

    #[test]
    fn new_child_beyond_previous_children_gets_recursed_with_no_previous() {
        let login_key = [5u8; 32];
        let prev = LoginStash::new_root(codecs::base64_encode(&[1u8; 32]), "alice".to_string());
        let child_key = [2u8; 32];
        let mut reply = minimal_reply(&prev.login_id);
        let mut reply_child = minimal_reply("child-login-id");
        reply_child.parent_box = Some(envelope::encrypt(&child_key, &login_key));
        reply.children.push(reply_child);

        let stash = apply_login_reply(Some(&prev), &reply, &login_key).unwrap();
        assert_eq!(stash.children.len(), 1);
        assert_eq!(stash.children[0].login_id, "child-login-id");
    }

    #[test]
    fn reply_targeting_a_non_root_node_is_found_and_spliced_back_in() {
        let login_key = [5u8; 32];
        let mut prev = LoginStash::new_root(codecs::base64_encode(&[1u8; 32]), "alice".to_string());
        let mut child = LoginStash::default();
        child.app_id = "app.a".to_string();
        child.login_id = "child-login-id".to_string();
        prev.children.push(child);

        let mut reply = minimal_reply("child-login-id");
        reply.app_id = "app.a".to_string();
        let stash = apply_login_reply(Some(&prev), &reply, &login_key).unwrap();

        assert_eq!(stash.login_id, prev.login_id);
        assert_eq!(stash.children.len(), 1);
        assert_eq!(stash.children[0].login_id, "child-login-id");
        assert_eq!(stash.children[0].app_id, "app.a");
    }

    #[test]
    fn reply_targeting_an_unknown_login_id_is_rejected() {
        let login_key = [5u8; 32];
        let prev = LoginStash::new_root(codecs::base64_encode(&[1u8; 32]), "alice".to_string());
        let reply = minimal_reply("nowhere-to-be-found");

        let err = apply_login_reply(Some(&prev), &reply, &login_key).unwrap_err();
        matches!(err.into_kind(), crate::error::ErrorKind::MissingLogin(_));
    }
}
