/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! One-shot binding between a script's "open new window" request and the
//! engine instance that ends up serving the popup.

use std::fmt;

use log::debug;

use crate::types::SessionError;

/// Opaque reference an engine hands out so an opener page can reach the
/// popup page it created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransportRef(pub u64);

/// The native creation token attached to a create-window request.
///
/// Delivering consumes the token, so a token can reach its opener at most
/// once.
pub trait PopupDelivery {
    fn deliver(self: Box<Self>, transport: TransportRef);
}

impl<F: FnOnce(TransportRef)> PopupDelivery for F {
    fn deliver(self: Box<Self>, transport: TransportRef) {
        (*self)(transport)
    }
}

/// Pending popup request waiting for its window's first handle.
pub struct PopupHandshake {
    token: Option<Box<dyn PopupDelivery>>,
}

impl PopupHandshake {
    pub fn new(token: Box<dyn PopupDelivery>) -> Self {
        Self { token: Some(token) }
    }

    pub fn is_resolved(&self) -> bool {
        self.token.is_none()
    }

    /// Deliver `transport` to the opener. Fails on every call after the first.
    pub fn resolve(&mut self, transport: TransportRef) -> Result<(), SessionError> {
        let token = self
            .token
            .take()
            .ok_or(SessionError::HandshakeAlreadyResolved)?;
        token.deliver(transport);
        Ok(())
    }
}

impl fmt::Debug for PopupHandshake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopupHandshake")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl Drop for PopupHandshake {
    fn drop(&mut self) {
        if self.token.is_some() {
            // The opener keeps an unresolved popup reference; nothing to report.
            debug!("discarding unresolved popup handshake");
        }
    }
}
