//! Connected-wallet session state.
//!
//! A session tracks, per chain family, which identity the user connected
//! with and the authentication proof they signed for the gateway. It also
//! holds the route of the transfer currently being prepared so wallet
//! adapters know which chain pair a signature belongs to.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::types::{ChainDescriptor, ChainFamily};

/// Session handle shared between the wallet service, adapters and the
/// transfer orchestrator.
pub type SharedSession = Arc<RwLock<SessionState>>;

/// Fresh, empty shared session.
pub fn shared_session() -> SharedSession {
    Arc::new(RwLock::new(SessionState::default()))
}

// ============================================================================
// Types
// ============================================================================

/// One connected wallet: its chain identity and, once the user has signed
/// the authentication message, the proof signature the gateway accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSession {
    pub identity: String,
    pub auth_signature: Option<String>,
}

/// Sender and recipient chains of the transfer being prepared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRoute {
    pub sender: ChainDescriptor,
    pub recipient: ChainDescriptor,
}

/// All session state: one optional [`WalletSession`] per chain family plus
/// the active transfer route.
#[derive(Debug, Default)]
pub struct SessionState {
    sessions: HashMap<ChainFamily, WalletSession>,
    route: Option<TransferRoute>,
}

// ============================================================================
// Operations
// ============================================================================

impl SessionState {
    pub fn session(&self, family: ChainFamily) -> Option<&WalletSession> {
        self.sessions.get(&family)
    }

    /// Records the identity a wallet connected with. Any previous
    /// authentication proof for the family is discarded.
    pub fn set_identity(&mut self, family: ChainFamily, identity: String) {
        self.sessions.insert(
            family,
            WalletSession {
                identity,
                auth_signature: None,
            },
        );
    }

    /// Stores the signed authentication proof. Does nothing when no wallet
    /// is connected for the family.
    pub fn set_auth_signature(&mut self, family: ChainFamily, signature: String) {
        if let Some(session) = self.sessions.get_mut(&family) {
            session.auth_signature = Some(signature);
        }
    }

    pub fn auth_signature(&self, family: ChainFamily) -> Option<&str> {
        self.sessions
            .get(&family)?
            .auth_signature
            .as_deref()
    }

    pub fn is_connected(&self, family: ChainFamily) -> bool {
        self.sessions.contains_key(&family)
    }

    /// Drops the session for one family, e.g. on wallet disconnect.
    pub fn clear(&mut self, family: ChainFamily) {
        self.sessions.remove(&family);
    }

    pub fn set_route(&mut self, route: TransferRoute) {
        self.route = Some(route);
    }

    pub fn route(&self) -> Option<&TransferRoute> {
        self.route.as_ref()
    }

    pub fn clear_route(&mut self) {
        self.route = None;
    }
}

// ============================================================================
// Tests
// ============================================================================
