//! Classification of rejected headers.

/// Broad class of a rejection, telling the caller what to do with the source
/// of the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionKind {
    /// The caller passed something unusable; a bug on the calling side.
    MalformedInput,
    /// Late, duplicate or premature header; drop it silently.
    TemporalOrdering,
    /// The header does not authenticate; log it and consider penalising the peer.
    Authenticity,
}

impl RejectionKind {
    /// Whether the peer that supplied the header deserves a penalty.
    pub fn is_peer_fault(self) -> bool {
        matches!(self, RejectionKind::Authenticity)
    }
}
