/// Lifecycle state of a client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Transport accepted, nothing received yet.
    Connecting,
    /// Handshake seen, waiting for the login packet.
    AwaitingLogin,
    /// Logged in. Movement, chat and block edits are only processed here.
    Active,
    /// Terminal. No further bytes are parsed and no packets are sent.
    Disconnecting,
}

impl ConnectionState {
    pub fn accepts_login(self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::AwaitingLogin)
    }

    pub fn is_active(self) -> bool {
        self == ConnectionState::Active
    }

    pub fn is_terminal(self) -> bool {
        self == ConnectionState::Disconnecting
    }
}
