//! Per-connection vote agents and the per-torrent controller.
//!
//! The engine drives each agent from the torrent's session loop: a roughly
//! once-per-second tick, and delivery of already-framed extension messages.
//! Neither callback blocks or performs I/O; outbound frames are handed to
//! the connection's [`Outbound`] buffer.

use crate::candidates::CandidateRegistry;
use crate::constants::{
    DEFAULT_EXTENSION_ID, EXTENSION_NAME, MAX_VOTE_PEERS, VOTE_INTERVAL_TICKS,
};
use crate::extension::{frame_extended, ExtensionHandshake};
use crate::swarm::{
    CandidateSource, ChokingStrategy, ConnectPolicy, ConnectionKind, Outbound, PeerRecord,
};
use crate::vote::VoteMessage;
use std::cmp::Ordering;
use std::net::{IpAddr, SocketAddr, SocketAddrV4};
use tracing::{debug, trace};

/// Per-torrent controller. Attaches a [`VoteAgent`] to every new connection
/// that speaks the base wire protocol; holds no other state.
#[derive(Debug, Clone)]
pub struct VoteExtension {
    extension_id: u8,
}

impl VoteExtension {
    pub fn new() -> Self {
        Self {
            extension_id: DEFAULT_EXTENSION_ID,
        }
    }

    pub fn with_extension_id(extension_id: u8) -> Self {
        Self { extension_id }
    }

    /// Builds the agent for a newly established connection, or `None` when
    /// the transport cannot carry extension messages.
    pub fn new_connection(&self, kind: ConnectionKind, remote: SocketAddr) -> Option<VoteAgent> {
        if kind != ConnectionKind::BitTorrent {
            return None;
        }
        Some(VoteAgent::new(self.extension_id, remote))
    }
}

impl Default for VoteExtension {
    fn default() -> Self {
        Self::new()
    }
}

/// Vote emitter/receiver bound to one connection.
#[derive(Debug)]
pub struct VoteAgent {
    extension_id: u8,
    remote: SocketAddr,
    tick_count: u32,
    candidates: CandidateRegistry,
}

impl VoteAgent {
    pub fn new(extension_id: u8, remote: SocketAddr) -> Self {
        Self {
            extension_id,
            remote,
            tick_count: 0,
            candidates: CandidateRegistry::new(),
        }
    }

    /// Remote endpoint of the owning connection.
    pub fn remote(&self) -> SocketAddr {
        self.remote
    }

    /// Extension id votes are sent and matched under.
    pub fn extension_id(&self) -> u8 {
        self.extension_id
    }

    /// Addresses learned from this connection's votes so far.
    pub fn candidates(&self) -> &CandidateRegistry {
        &self.candidates
    }

    /// Adopts the message id the remote assigned to the vote extension in
    /// its handshake, when it offered one.
    pub fn on_extension_handshake(&mut self, handshake: &ExtensionHandshake) {
        if let Some(id) = handshake.extension_id(EXTENSION_NAME) {
            trace!(remote = %self.remote, id, "remote negotiated vote extension id");
            self.extension_id = id;
        }
    }

    /// Once-per-second driver callback. Every [`VOTE_INTERVAL_TICKS`] ticks
    /// the agent evaluates eligibility and, against a seeding remote under
    /// the vote-biased strategy, reports the best peers of the torrent.
    pub fn on_tick<P, O>(
        &mut self,
        remote_is_seed: bool,
        strategy: ChokingStrategy,
        peers: &[P],
        out: &mut O,
    ) where
        P: PeerRecord,
        O: Outbound,
    {
        self.tick_count += 1;
        if self.tick_count < VOTE_INTERVAL_TICKS {
            return;
        }
        self.tick_count = 0;

        // Votes only go to the seeding side of a connection.
        if !remote_is_seed || strategy != ChokingStrategy::VoteBiased {
            return;
        }

        self.send_best_peers(peers, out);
    }

    fn send_best_peers<P, O>(&self, peers: &[P], out: &mut O)
    where
        P: PeerRecord,
        O: Outbound,
    {
        let mut ranked: Vec<&P> = peers.iter().filter(|p| !p.is_seed()).collect();
        if ranked.is_empty() {
            trace!(remote = %self.remote, "no peers to vote for");
            return;
        }

        ranked.sort_by(|a, b| {
            b.payload_download_rate()
                .partial_cmp(&a.payload_download_rate())
                .unwrap_or(Ordering::Equal)
        });

        let mut vote = VoteMessage::new();
        for peer in ranked.iter().take(MAX_VOTE_PEERS) {
            // A selected peer without an IPv4 endpoint still spends its slot.
            let SocketAddr::V4(observed) = peer.remote() else {
                continue;
            };
            // The port we connected to is not necessarily the port the peer
            // listens on; prefer what it advertised about itself.
            let port = peer.listen_port().unwrap_or(observed.port());
            vote.peers.push(SocketAddrV4::new(*observed.ip(), port));
        }

        if vote.peers.is_empty() {
            return;
        }

        trace!(remote = %self.remote, count = vote.peers.len(), "sending vote");
        out.send(frame_extended(self.extension_id, &vote.encode()));
    }

    /// Extension message delivery. Returns `false` when the message belongs
    /// to a different extension; `true` in every other case, malformed
    /// payloads included.
    pub fn on_message<P, C>(
        &mut self,
        extension_id: u8,
        payload: &[u8],
        peers: &mut [P],
        policy: &mut C,
    ) -> bool
    where
        P: PeerRecord,
        C: ConnectPolicy,
    {
        if extension_id != self.extension_id {
            return false;
        }

        let vote = match VoteMessage::decode(payload) {
            Ok(vote) => vote,
            Err(err) => {
                debug!(remote = %self.remote, %err, "dropping malformed vote");
                return true;
            }
        };

        // Votes match on address only; source ports are not stable across
        // NATs. The first record with the address takes the rank's points.
        let mut matched = [false; MAX_VOTE_PEERS];
        for peer in peers.iter_mut() {
            let IpAddr::V4(ip) = peer.remote().ip() else {
                continue;
            };
            for (rank, endpoint) in vote.peers.iter().enumerate() {
                if !matched[rank] && *endpoint.ip() == ip {
                    matched[rank] = true;
                    peer.add_votes((MAX_VOTE_PEERS - rank) as u32);
                }
            }
        }

        for (rank, endpoint) in vote.peers.iter().enumerate() {
            if matched[rank] {
                continue;
            }
            if self.candidates.insert(*endpoint) {
                trace!(remote = %self.remote, candidate = %endpoint, "vote names an unknown peer");
                policy.add_candidate(*endpoint, CandidateSource::SwarmReported);
            }
        }

        true
    }
}
