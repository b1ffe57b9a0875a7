use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use tokenboard_core::{TokenColor, TokenShape, TrackedToken};

/// Errors crossing the remote-authority boundary.
///
/// Implementations must bound every call with a transport timeout; the
/// tracker and the sync worker treat a slow authority exactly like a
/// failed one, and process shutdown must never wait on a dead socket.
#[derive(thiserror::Error, Debug)]
pub enum RemoteError {
    #[error("remote call timed out")]
    Timeout,
    #[error("remote authority unavailable: {0}")]
    Unavailable(String),
    #[error("remote protocol error: {0}")]
    Protocol(String),
}

/// A token as the remote authority reports it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteToken {
    pub remote_id: u32,
    pub world: Point2<f64>,
    pub shape: TokenShape,
    pub color: TokenColor,
}

/// Planning-server boundary. Wire format and transport live outside
/// this crate; the tracker only sees these three calls.
pub trait RemoteAuthority: Send + Sync {
    /// Register a new geographic token; returns the authority's id.
    fn create(
        &self,
        shape: TokenShape,
        color: TokenColor,
        world: Point2<f64>,
    ) -> Result<u32, RemoteError>;

    fn remove(&self, remote_id: u32) -> Result<(), RemoteError>;

    fn list_all(&self) -> Result<Vec<RemoteToken>, RemoteError>;
}

/// On-table UI hit-testing, implemented by the widget layer.
pub trait HitTester: Send + Sync {
    /// Whether a token, given in projector space, sits on a UI
    /// hit-region.
    fn is_on_ui(&self, token: &TrackedToken) -> bool;
}
