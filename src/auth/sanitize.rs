//! `sanitizeLoginStash` (§4.5): what a cooperating app of narrower scope is
//! allowed to see of a shared login tree.

use crate::tree_engine::{self, TreeNode};
use crate::types::stash::LoginStash;

/// Returns the subtree rooted at `app_id` verbatim; every node outside that
/// subtree is projected to identity-only fields via `LoginStash::outer_clone`.
pub fn sanitize_login_stash(stash_tree: &LoginStash, app_id: &str) -> LoginStash {
    tree_engine::update_with_clone(
        stash_tree,
        &|n: &LoginStash| n.app_id == app_id,
        &|n| n,
        &|n| n.outer_clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{codecs, envelope};

    #[test]
    fn matching_subtree_is_returned_verbatim() {
        let login_key = [1u8; 32];
        let mut root = LoginStash::new_root(codecs::base64_encode(&[2u8; 32]), "alice".to_string());
        root.password_auth_box = Some(envelope::encrypt(&[3u8; 32], &login_key));

        let mut app_a = LoginStash::default();
        app_a.app_id = "app.a".to_string();
        app_a.password_auth_box = Some(envelope::encrypt(&[9u8; 32], &login_key));
        root.children.push(app_a);

        let sanitized = sanitize_login_stash(&root, "app.a");
        assert!(sanitized.children[0].password_auth_box.is_some());
    }

    #[test]
    fn ancestors_outside_target_lose_secrets() {
        let login_key = [1u8; 32];
        let mut root = LoginStash::new_root(codecs::base64_encode(&[2u8; 32]), "alice".to_string());
        root.password_auth_box = Some(envelope::encrypt(&[3u8; 32], &login_key));

        let mut app_a = LoginStash::default();
        app_a.app_id = "app.a".to_string();
        root.children.push(app_a);

        let sanitized = sanitize_login_stash(&root, "app.a");
        assert!(sanitized.password_auth_box.is_none());
        assert_eq!(sanitized.username.as_deref(), Some("alice"));
    }
}
