//! peer_idol - swarm reputation voting for BitTorrent engines
//!
//! While a connection's remote peer is seeding, the local side periodically
//! reports the addresses of the best peers it knows of, ranked by observed
//! download throughput. A seed receiving such votes awards rank-weighted
//! reputation points to peers it already knows and registers unseen
//! addresses as new connection candidates, so its unchoke decisions can
//! lean on what the swarm finds valuable rather than local measurement
//! alone.
//!
//! The crate is the extension's protocol state machine only. Connection
//! lifecycle, choking itself, and transport framing stay in the host
//! engine, which drives each per-connection [`VoteAgent`] through two
//! callbacks: a roughly once-per-second tick and extension-message
//! delivery.
//!
//! # Modules
//!
//! - [`agent`] - Per-connection vote emitter/receiver and per-torrent controller
//! - [`bencode`] - BEP-3 structured encoding for payloads
//! - [`candidates`] - Sorted, deduplicated candidate address registry
//! - [`extension`] - BEP-10 handshake subset and extended-message framing
//! - [`swarm`] - Traits the host engine implements
//! - [`vote`] - Vote message and compact endpoint codec

pub mod agent;
pub mod bencode;
pub mod candidates;
pub mod constants;
pub mod extension;
pub mod swarm;
pub mod vote;

pub use agent::{VoteAgent, VoteExtension};
pub use bencode::{decode, encode, BencodeError, Value};
pub use candidates::CandidateRegistry;
pub use extension::{frame_extended, ExtensionError, ExtensionHandshake};
pub use swarm::{
    CandidateSource, ChokingStrategy, ConnectPolicy, ConnectionKind, Outbound, PeerRecord,
};
pub use vote::{decode_endpoints, encode_endpoints, VoteError, VoteMessage};
