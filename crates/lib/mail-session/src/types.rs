//! Message identifiers and search types.

use core::fmt;
use core::num::NonZeroU32;

/// A 1-based message sequence number, valid until the next expunge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageRef(NonZeroU32);

impl MessageRef {
    /// Wrap a raw sequence number; zero is not a valid one.
    pub const fn new(seq: u32) -> Option<Self> {
        match NonZeroU32::new(seq) {
            Some(seq) => Some(Self(seq)),
            None => None,
        }
    }

    /// The raw sequence number.
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// The position this message moves to after the message at `removed` is
    /// expunged, or `None` if it was this message.
    pub fn after_expunge(self, removed: MessageRef) -> Option<Self> {
        match self.cmp(&removed) {
            core::cmp::Ordering::Less => Some(self),
            core::cmp::Ordering::Equal => None,
            core::cmp::Ordering::Greater => Self::new(self.get() - 1),
        }
    }
}

impl fmt::Display for MessageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A mailbox-assigned unique identifier, stable until the message is expunged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageUid(NonZeroU32);

impl MessageUid {
    /// Wrap a raw UID; zero is not a valid one.
    pub const fn new(uid: u32) -> Option<Self> {
        match NonZeroU32::new(uid) {
            Some(uid) => Some(Self(uid)),
            None => None,
        }
    }

    /// The raw UID.
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for MessageUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Matching messages in ascending sequence order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult(Vec<MessageRef>);

impl SearchResult {
    /// Build from raw sequence numbers in any order, dropping zeros and duplicates.
    pub fn from_unordered(seqs: impl IntoIterator<Item = u32>) -> Self {
        let mut refs: Vec<_> = seqs.into_iter().filter_map(MessageRef::new).collect();
        refs.sort_unstable();
        refs.dedup();
        Self(refs)
    }

    /// Number of matches.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing matched.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The matches, ascending.
    pub fn as_slice(&self) -> &[MessageRef] {
        &self.0
    }
}

impl IntoIterator for SearchResult {
    type Item = MessageRef;
    type IntoIter = std::vec::IntoIter<MessageRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Sender predicate for the mailbox search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    /// The sender address to match.
    sender: String,
}

impl SearchFilter {
    /// Match messages whose `From` contains `sender`.
    pub fn from_sender(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
        }
    }

    /// The sender address to match.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Render as an IMAP search key, e.g. `FROM "camera@example.com"`.
    pub fn to_query(&self) -> String {
        let mut query = String::with_capacity(self.sender.len() + 7);
        query.push_str("FROM \"");
        for c in self.sender.chars().filter(|c| !matches!(c, '\r' | '\n')) {
            if matches!(c, '"' | '\\') {
                query.push('\\');
            }
            query.push(c);
        }
        query.push('"');
        query
    }
}

/// A complete message as stored on the server, headers and body.
#[derive(Clone, PartialEq, Eq)]
pub struct RawMessage(Vec<u8>);

impl RawMessage {
    /// Wrap raw message bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// The message bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Take the message bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl fmt::Debug for RawMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawMessage")
            .field("len", &self.0.len())
            .finish()
    }
}
