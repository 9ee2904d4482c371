//! Protocol constants and tuning parameters.

// ============================================================================
// Extension negotiation
// ============================================================================

/// Extension name advertised in the BEP-10 handshake `m` dictionary.
pub const EXTENSION_NAME: &str = "peer_idol";

/// Extension message id assumed when the remote never negotiated one.
pub const DEFAULT_EXTENSION_ID: u8 = 23;

/// Extended message tag in the base wire protocol (BEP-10).
pub const EXTENDED_MESSAGE_ID: u8 = 20;

/// Extension handshake message id (BEP-10).
pub const EXTENSION_HANDSHAKE_ID: u8 = 0;

// ============================================================================
// Vote cadence and limits
// ============================================================================

/// Ticks between vote emissions. The external driver ticks roughly once per
/// second, so votes go out about every 15 seconds.
pub const VOTE_INTERVAL_TICKS: u32 = 15;

/// Maximum peers named in a single vote.
pub const MAX_VOTE_PEERS: usize = 3;

/// Compact endpoint size: 4 address bytes plus 2 port bytes, big-endian.
pub const COMPACT_ENDPOINT_LEN: usize = 6;

/// Longest accepted `added` value in a received vote.
pub const MAX_ADDED_LEN: usize = MAX_VOTE_PEERS * COMPACT_ENDPOINT_LEN;
