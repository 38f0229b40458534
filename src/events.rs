//! Event channel (§4.9, §9 "state distribution"). The source fans state
//! changes out through a reactive store; this crate models the same thing as
//! a plain `mpsc::Sender` the caller owns and polls or bridges elsewhere.

use std::sync::mpsc::Sender;

use crate::types::stash::LoginStash;

#[derive(Clone, Debug)]
pub enum LoginCoreEvent {
    LoginStashSaved(LoginStash),
    LoginStashDeleted(String),
}

/// Wraps an `mpsc::Sender` so publish sites read as intent (`publisher.
/// stash_saved(..)`) rather than raw channel sends, and so a disconnected
/// receiver never becomes the caller's problem.
#[derive(Clone)]
pub struct Publisher {
    sender: Sender<LoginCoreEvent>,
}

impl Publisher {
    pub fn new(sender: Sender<LoginCoreEvent>) -> Self {
        Publisher { sender }
    }

    pub fn stash_saved(&self, stash: LoginStash) {
        let _ = self.sender.send(LoginCoreEvent::LoginStashSaved(stash));
    }

    pub fn stash_deleted(&self, username: impl Into<String>) {
        let _ = self.sender.send(LoginCoreEvent::LoginStashDeleted(username.into()));
    }
}
