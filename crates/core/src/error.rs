use thiserror::Error;

#[derive(Error, Debug)]
pub enum MixCraftError {
    #[error("Malformed packet: buffer of {got} bytes is shorter than the {min}-byte header")]
    MalformedPacket { got: usize, min: usize },

    #[error("Forward failed: {0}")]
    ForwardFailed(String),

    #[error("Relay disabled: node has no signing key")]
    RelayDisabled,

    #[error("Duplicate packet")]
    DuplicatePacket,

    #[error("Invalid ticket: {0}")]
    InvalidTicket(String),

    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("Channel already open: {0}")]
    ChannelAlreadyOpen(String),

    #[error("Stale account entry for channel {0}")]
    StaleAccountEntry(String),

    #[error("Invalid channel state value: {0}")]
    InvalidChannelState(u64),

    #[error("Balance overflow")]
    BalanceOverflow,

    #[error("Balance kind mismatch")]
    BalanceKindMismatch,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Acknowledgement from unexpected signer")]
    UnexpectedAckSigner,

    #[error("Connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, MixCraftError>;
