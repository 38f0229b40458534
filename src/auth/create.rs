//! `createLogin` (§4.5): assembles a brand-new `LoginStash` — root or child —
//! and registers it with the server before persisting it locally.
//!
//! This crate has no device benchmark bridge (§1 non-goals), so every scrypt
//! parameter choice here calls `choose_scrypt_params(0, target_ms)`, which
//! deliberately falls back to the fixed worst-case parameters rather than
//! guessing a benchmark.

use rand::RngCore;
use serde_json::{json, Value};

use crate::crypto::{codecs, envelope, hash_username, scrypt_params, scrypt_queue::{self, ScryptQueue}};
use crate::error::{Error, ErrorKind};
use crate::events::Publisher;
use crate::server::{self, HttpMethod, LoginFetch};
use crate::stash_store::{normalize_username, Disklet, StashStore};
use crate::types::envelope::EdgeSnrp;
use crate::types::stash::LoginStash;

const AUTH_DKLEN: usize = 32;

/// A freshly derived parent link, carried by a child account creation.
pub struct Parent<'a> {
    pub login_key: &'a [u8],
}

#[derive(Default)]
pub struct CreateLoginOptions<'a> {
    pub username: String,
    pub app_id: String,
    pub password: Option<String>,
    pub pin: Option<String>,
    pub parent: Option<Parent<'a>>,
    pub scrypt_target_ms: u32,
}

fn random_bytes(n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    buf
}

async fn derive_password_fields(
    password: &str,
    login_key: &[u8],
    queue: &ScryptQueue,
    target_ms: u32,
) -> Result<(EdgeSnrp, EdgeSnrp, crate::types::envelope::EdgeBox, crate::types::envelope::EdgeBox), Error> {
    let (n, r, p) = scrypt_params::choose_scrypt_params(0, target_ms as u64);
    let password_key_snrp = scrypt_queue::make_snrp(n, r, p);
    let password_auth_snrp = scrypt_queue::make_snrp(n, r, p);

    let password_key = queue.derive(password.as_bytes(), &password_key_snrp, AUTH_DKLEN).await?;
    let password_auth = queue.derive(password.as_bytes(), &password_auth_snrp, AUTH_DKLEN).await?;

    let password_box = envelope::encrypt(login_key, &password_key);
    let password_auth_box = envelope::encrypt(&password_auth, login_key);

    Ok((password_key_snrp, password_auth_snrp, password_box, password_auth_box))
}

/// §4.5 `createLogin`. Persists the assembled stash via `stash_store` only
/// after the server accepts the creation request.
pub async fn create_login<F: LoginFetch, D: Disklet>(
    opts: CreateLoginOptions<'_>,
    queue: &ScryptQueue,
    login_fetch: &F,
    stash_store: &StashStore<D>,
    publisher: Option<&Publisher>,
) -> Result<(LoginStash, Vec<u8>), Error> {
    let username = normalize_username(&opts.username);

    let login_id = if opts.parent.is_none() {
        hash_username(&username).to_vec()
    } else {
        random_bytes(32)
    };
    let login_id_b64 = codecs::base64_encode(&login_id);

    let login_key = random_bytes(32);
    let login_auth = random_bytes(32);
    let login_auth_box = envelope::encrypt(&login_auth, &login_key);

    let parent_box = opts.parent.as_ref().map(|p| envelope::encrypt(&login_key, p.login_key));

    let mut stash = LoginStash {
        app_id: opts.app_id.clone(),
        login_id: login_id_b64.clone(),
        username: if opts.parent.is_none() { Some(username.clone()) } else { None },
        created: Some(chrono::Utc::now()),
        last_login: Some(chrono::Utc::now()),
        login_auth_box: Some(login_auth_box),
        parent_box,
        ..Default::default()
    };

    let mut create_payload = json!({
        "appId": stash.app_id,
        "loginId": stash.login_id,
        "loginAuthBox": stash.login_auth_box,
        "parentBox": stash.parent_box,
    });

    if let Some(password) = &opts.password {
        let (password_key_snrp, password_auth_snrp, password_box, password_auth_box) =
            derive_password_fields(password, &login_key, queue, opts.scrypt_target_ms).await?;
        stash.password_key_snrp = Some(password_key_snrp.clone());
        stash.password_auth_snrp = Some(password_auth_snrp.clone());
        stash.password_box = Some(password_box.clone());
        stash.password_auth_box = Some(password_auth_box.clone());
        create_payload["passwordKeySnrp"] = json!(password_key_snrp);
        create_payload["passwordAuthSnrp"] = json!(password_auth_snrp);
        create_payload["passwordBox"] = json!(password_box);
        create_payload["passwordAuthBox"] = json!(password_auth_box);
    }

    if let Some(pin) = &opts.pin {
        let pin2_key = random_bytes(32);
        let pin2_text_box = envelope::encrypt_text(pin, &pin2_key);
        stash.pin2_key = Some(codecs::base64_encode(&pin2_key));
        stash.pin2_text_box = Some(pin2_text_box.clone());
        create_payload["pin2TextBox"] = json!(pin2_text_box);
    }

    let auth: Value = json!({});
    let request = server::build_request(auth, create_payload);
    let raw = login_fetch.call(HttpMethod::Post, "/v2/login/create", request).await?;
    server::parse_reply(&raw)?;

    // A root login is its own saveable tree. A child login has to be
    // spliced into its parent's existing tree and the *whole* tree re-saved
    // — `validate_for_save` only ever accepts a root (`appId == ""`).
    match &opts.parent {
        None => stash_store.save_stash(&stash, publisher)?,
        Some(_) => {
            let mut root_stash = stash_store
                .load_stashes()?
                .into_iter()
                .find(|s| s.username.as_deref().map(normalize_username).as_deref() == Some(username.as_str()))
                .ok_or_else(|| {
                    ErrorKind::InvalidStash(format!("no on-disk root stash for username `{username}` to attach child to"))
                })?;
            root_stash.children.push(stash.clone());
            stash_store.save_stash(&root_stash, publisher)?;
        }
    }

    Ok((stash, login_key))
}
