//! Interfaces to the owning swarm engine.
//!
//! The extension never owns peers, connections, or the torrent; the engine
//! passes call-scoped views into the agent callbacks. The only mutation the
//! extension performs on engine state is awarding vote points through
//! [`PeerRecord::add_votes`].

use bytes::Bytes;
use std::net::{SocketAddr, SocketAddrV4};

/// One live peer of the owning torrent, as seen by the vote extension.
///
/// Implemented by the engine's peer records. Records are borrowed for the
/// duration of a single callback and never stored.
pub trait PeerRecord {
    /// Remote endpoint of the live connection.
    fn remote(&self) -> SocketAddr;

    /// Whether the peer already has the complete payload.
    fn is_seed(&self) -> bool;

    /// Observed useful-data throughput from this peer, in bytes per second.
    fn payload_download_rate(&self) -> f64;

    /// Listening port the peer advertised about itself, when known. The
    /// observed connection port differs from it whenever we initiated the
    /// connection through a NAT.
    fn listen_port(&self) -> Option<u16>;

    /// Awards reputation points to this peer.
    fn add_votes(&mut self, points: u32);
}

/// How a candidate address was learned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    /// Observed directly: tracker response, DHT, incoming connection.
    Observed,
    /// Reported by another peer's vote; low trust until connected.
    SwarmReported,
}

/// The engine's peer-connection policy. Receives addresses worth an
/// opportunistic connection attempt; deduplicates internally as it sees fit.
pub trait ConnectPolicy {
    fn add_candidate(&mut self, addr: SocketAddrV4, source: CandidateSource);
}

/// Outbound buffer of the owning connection. Sends are fire-and-forget.
pub trait Outbound {
    fn send(&mut self, frame: Bytes);
}

/// Seeding unchoke strategy configured on a torrent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChokingStrategy {
    /// Classic tit-for-tat by locally observed rates.
    RateBased,
    /// Unchoke decisions biased by swarm-reported vote counts.
    VoteBiased,
}

/// Transport variant of a newly established connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    /// Base peer wire protocol; the only transport that carries extensions.
    BitTorrent,
    /// HTTP web seed (BEP-19).
    WebSeed,
}
