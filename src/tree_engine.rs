//! Generic search/update/clone over a recursive node structure (§4.2), used
//! for both `LoginStash` and `LoginTree`. The source's duck-typed
//! `{children?}` shape becomes a single trait every node type implements.

/// A node in a recursive tree. `outer_clone` is the "projection" used when a
/// caller descends into a subtree it doesn't own (§4.3, §4.5 sanitize): it
/// must drop any field the source didn't list as part of the identity-only
/// projection.
pub trait TreeNode: Clone + Sized {
    fn children(&self) -> &[Self];
    fn with_children(self, children: Vec<Self>) -> Self;
    fn outer_clone(&self) -> Self;
}

/// Pre-order depth-first search for the first node matching `predicate`.
pub fn search<'a, N: TreeNode>(root: &'a N, predicate: &dyn Fn(&N) -> bool) -> Option<&'a N> {
    if predicate(root) {
        return Some(root);
    }
    for child in root.children() {
        if let Some(found) = search(child, predicate) {
            return Some(found);
        }
    }
    None
}

/// Rebuilds `root` with the unique node matching `predicate` replaced by
/// `transform(match)`. Every ancestor is rebuilt with its children list
/// replaced; subtrees that are siblings of the match-path are left as a full
/// `Clone`. If no node matches, returns an unmodified clone of `root`.
pub fn update<N: TreeNode>(root: &N, predicate: &dyn Fn(&N) -> bool, transform: &dyn Fn(N) -> N) -> N {
    update_with_clone(root, predicate, transform, &|n: &N| n.clone())
}

/// General form of `update` that lets the caller supply the clone used for
/// non-ancestor subtrees — e.g. the "outer clone" projection (§4.3 builder,
/// §4.5 `sanitizeLoginStash`) instead of a full structural clone.
pub fn update_with_clone<N: TreeNode>(
    root: &N,
    predicate: &dyn Fn(&N) -> bool,
    transform: &dyn Fn(N) -> N,
    clone: &dyn Fn(&N) -> N,
) -> N {
    if predicate(root) {
        return transform(root.clone());
    }

    let mut on_match_path = false;
    let mut new_children = Vec::with_capacity(root.children().len());
    for child in root.children() {
        if !on_match_path && search(child, predicate).is_some() {
            on_match_path = true;
            new_children.push(update_with_clone(child, predicate, transform, clone));
        } else {
            new_children.push(clone(child));
        }
    }

    clone(root).with_children(new_children)
}
