//! `syncLogin` (§4.5): refreshes one node of a login tree against the
//! server, using the node's own `loginAuth`/`passwordAuth` as the auth
//! credential rather than a freshly derived one.

use chrono::Utc;

use super::auth_json::make_auth_json;
use crate::error::Error;
use crate::events::Publisher;
use crate::login_tree_builder;
use crate::reply_reconciler;
use crate::server::{self, HttpMethod, LoginFetch};
use crate::stash_store::{Disklet, StashStore};
use crate::types::reply::LoginReply;
use crate::types::stash::LoginStash;
use crate::types::tree::LoginTree;

/// POSTs `login`'s own auth fragment to `/v2/login`, treats the reply as
/// authoritative via `reply_reconciler::apply_login_reply`, rebuilds the
/// in-memory tree from the reconciled stash, and persists it. `login.loginId`
/// is located anywhere in `previous_stash` — it need not be the tree root.
pub async fn sync_login<F, D>(
    previous_stash: Option<&LoginStash>,
    login: &LoginTree,
    login_fetch: &F,
    stash_store: &StashStore<D>,
    publisher: Option<&Publisher>,
) -> Result<(LoginStash, LoginTree), Error>
where
    F: LoginFetch,
    D: Disklet,
{
    let auth = make_auth_json(login)?;

    let raw = login_fetch.call(HttpMethod::Post, "/v2/login", auth).await?;
    let results = server::parse_reply(&raw)?;
    let reply: LoginReply = serde_json::from_value(results)?;

    let mut new_stash = reply_reconciler::apply_login_reply(previous_stash, &reply, &login.login_key)?;
    new_stash.last_login = Some(Utc::now());
    stash_store.save_stash(&new_stash, publisher)?;

    let node = crate::tree_engine::search(&new_stash, &|n: &LoginStash| n.login_id == reply.login_id)
        .unwrap_or(&new_stash);
    let tree = login_tree_builder::make_login_tree_inner(node, &login.login_key)?;

    Ok((new_stash, tree))
}
