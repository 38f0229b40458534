//! Kit application (§4.5 `applyKit`/`applyKits`): an atomic mutation sent to
//! the server, then folded into the in-memory tree and the on-disk stash in
//! that order.

use serde_json::Value;

use super::auth_json::make_auth_json;
use crate::error::{Error, ErrorKind};
use crate::events::Publisher;
use crate::server::{self, LoginFetch};
use crate::stash_store::{Disklet, StashStore};
use crate::tree_engine;
use crate::types::kit::{LoginDelta, LoginKit, StashDelta};
use crate::types::stash::LoginStash;
use crate::types::tree::LoginTree;
use crate::types::wallet_info::merge_wallet_infos;

fn apply_login_delta(mut node: LoginTree, delta: &LoginDelta) -> LoginTree {
    if let Some(otp_key) = &delta.otp_key {
        node.otp_key = otp_key.clone();
    }
    if let Some(otp_reset_date) = &delta.otp_reset_date {
        node.otp_reset_date = *otp_reset_date;
    }
    if let Some(otp_timeout) = &delta.otp_timeout {
        node.otp_timeout = *otp_timeout;
    }
    if let Some(password_auth) = &delta.password_auth {
        node.password_auth = Some(password_auth.clone());
    }
    if let Some(pin) = &delta.pin {
        node.pin = pin.clone();
    }
    node.children.extend(delta.children.iter().cloned());
    node.key_infos = merge_wallet_infos(&node.key_infos, &delta.key_infos);
    node
}

fn apply_stash_delta(mut node: LoginStash, delta: &StashDelta) -> LoginStash {
    if let Some(otp_key) = &delta.otp_key {
        node.otp_key = otp_key.clone();
    }
    if let Some(otp_reset_date) = &delta.otp_reset_date {
        node.otp_reset_date = *otp_reset_date;
    }
    if let Some(otp_timeout) = &delta.otp_timeout {
        node.otp_timeout = *otp_timeout;
    }
    if let Some(b) = &delta.password_auth_box {
        node.password_auth_box = Some(b.clone());
    }
    if let Some(s) = &delta.password_auth_snrp {
        node.password_auth_snrp = Some(s.clone());
    }
    if let Some(b) = &delta.password_box {
        node.password_box = Some(b.clone());
    }
    if let Some(s) = &delta.password_key_snrp {
        node.password_key_snrp = Some(s.clone());
    }
    if let Some(b) = &delta.pin2_text_box {
        node.pin2_text_box = Some(b.clone());
    }
    node.key_boxes.extend(delta.key_boxes.iter().cloned());
    node.children.extend(delta.children.iter().cloned());
    node
}

/// §4.5 `applyKit`. `username` identifies which on-disk root stash to fold
/// the stash-side delta into.
pub async fn apply_kit<F: LoginFetch, D: Disklet>(
    login_tree: &LoginTree,
    username: &str,
    kit: &LoginKit,
    login_fetch: &F,
    stash_store: &StashStore<D>,
    publisher: Option<&Publisher>,
) -> Result<LoginTree, Error> {
    let target = tree_engine::search(login_tree, &|n: &LoginTree| n.login_id == kit.login_id)
        .ok_or_else(|| ErrorKind::MissingLogin(kit.login_id.clone()))?;

    let auth = make_auth_json(target)?;
    let data = kit.server.clone().unwrap_or(Value::Null);
    let request = server::build_request(auth, data);
    let method = match kit.server_method {
        crate::types::kit::ServerMethod::Post => crate::server::HttpMethod::Post,
        crate::types::kit::ServerMethod::Delete => crate::server::HttpMethod::Delete,
    };
    let raw = login_fetch.call(method, &kit.server_path, request).await?;
    server::parse_reply(&raw)?;

    let new_login_tree = tree_engine::update(
        login_tree,
        &|n: &LoginTree| n.login_id == kit.login_id,
        &|n| apply_login_delta(n, &kit.login),
    );

    let root_stash = stash_store
        .load_stashes()?
        .into_iter()
        .find(|s| s.username.as_deref().map(crate::stash_store::normalize_username).as_deref() == Some(&crate::stash_store::normalize_username(username)))
        .ok_or_else(|| ErrorKind::InvalidStash(format!("no on-disk stash for username `{username}`")))?;

    let new_stash_tree = tree_engine::update(
        &root_stash,
        &|n: &LoginStash| n.login_id == kit.login_id,
        &|n| apply_stash_delta(n, &kit.stash),
    );

    stash_store.save_stash(&new_stash_tree, publisher)?;

    Ok(new_login_tree)
}

/// §4.5 `applyKits`: strictly sequential — each kit's result feeds the next
/// call. Never parallelized; kits can mutate overlapping subtrees.
pub async fn apply_kits<F: LoginFetch, D: Disklet>(
    login_tree: &LoginTree,
    username: &str,
    kits: &[LoginKit],
    login_fetch: &F,
    stash_store: &StashStore<D>,
    publisher: Option<&Publisher>,
) -> Result<LoginTree, Error> {
    let mut tree = login_tree.clone();
    for kit in kits {
        tree = apply_kit(&tree, username, kit, login_fetch, stash_store, publisher).await?;
    }
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{codecs, envelope};
    use crate::server::MockLoginFetch;
    use crate::stash_store::FsDisklet;
    use crate::types::kit::ServerMethod;
    use serde_json::json;

    fn tree_with_password() -> LoginTree {
        let mut tree = LoginTree::default();
        tree.login_id = codecs::base64_encode(&[1u8; 32]);
        tree.password_auth = Some(vec![9u8; 32]);
        tree.user_id = Some(tree.login_id.clone());
        tree
    }

    #[tokio::test]
    async fn apply_kit_merges_delta_and_persists_stash() {
        let dir = tempfile::tempdir().unwrap();
        let store = StashStore::new(FsDisklet::new(dir.path()));

        let mut stash = LoginStash::new_root(codecs::base64_encode(&[1u8; 32]), "alice".to_string());
        stash.password_auth_box = Some(envelope::encrypt(&[9u8; 32], &[0u8; 32]));
        store.save_stash(&stash, None).unwrap();

        let tree = tree_with_password();
        let mock = MockLoginFetch::ok(json!({}));

        let kit = LoginKit {
            login_id: tree.login_id.clone(),
            server_method: ServerMethod::Post,
            server_path: "/v2/login/password".to_string(),
            server: Some(json!({ "passwordAuth": "xyz" })),
            stash: StashDelta::default(),
            login: LoginDelta {
                otp_key: Some(Some("AAAA".to_string())),
                ..Default::default()
            },
        };

        let new_tree = apply_kit(&tree, "alice", &kit, &mock, &store, None).await.unwrap();
        assert_eq!(new_tree.otp_key.as_deref(), Some("AAAA"));

        let reloaded = store.load_stashes().unwrap();
        assert_eq!(reloaded.len(), 1);
    }

    #[tokio::test]
    async fn apply_kits_runs_sequentially_and_threads_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = StashStore::new(FsDisklet::new(dir.path()));
        let mut stash = LoginStash::new_root(codecs::base64_encode(&[1u8; 32]), "alice".to_string());
        stash.password_auth_box = Some(envelope::encrypt(&[9u8; 32], &[0u8; 32]));
        store.save_stash(&stash, None).unwrap();

        let tree = tree_with_password();
        let mock = MockLoginFetch::new(vec![Ok(json!({"results": {}})), Ok(json!({"results": {}}))]);

        let kits = vec![
            LoginKit {
                login_id: tree.login_id.clone(),
                server_method: ServerMethod::Post,
                server_path: "/v2/login/otp".to_string(),
                server: None,
                stash: StashDelta::default(),
                login: LoginDelta {
                    otp_timeout: Some(Some(60)),
                    ..Default::default()
                },
            },
            LoginKit {
                login_id: tree.login_id.clone(),
                server_method: ServerMethod::Post,
                server_path: "/v2/login/pin".to_string(),
                server: None,
                stash: StashDelta::default(),
                login: LoginDelta {
                    pin: Some(Some("1234".to_string())),
                    ..Default::default()
                },
            },
        ];

        let new_tree = apply_kits(&tree, "alice", &kits, &mock, &store, None).await.unwrap();
        assert_eq!(new_tree.otp_timeout, Some(60));
        assert_eq!(new_tree.pin.as_deref(), Some("1234"));
    }
}
