//! In-memory mailbox implementing [`mail_session::MailSession`] for tests.
//!
//! Messages are numbered by position, so expunging renumbers everything
//! after the removed message just like a real server does.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use mail_session::{
    Command, Error, FetchFailure, MailSession, MessageRef, MessageUid, ParseError, RawMessage,
    SearchFilter, SearchResult,
};

/// A stored message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeMessage {
    /// Stable identifier.
    pub uid: u32,

    /// Sender address matched by searches.
    pub from: String,

    /// Full message bytes.
    pub raw: Vec<u8>,

    /// Whether the message is flagged `\Deleted`.
    pub deleted: bool,
}

/// A recorded session call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `search` with the given sender.
    Search(String),

    /// `fetch_body` with the given sequence number.
    FetchBody(u32),

    /// `fetch_uid` with the given sequence number.
    FetchUid(u32),

    /// `copy_to_folder`.
    Copy {
        /// The copied UID.
        uid: u32,

        /// The destination.
        folder: String,
    },

    /// `mark_deleted` with the given UID.
    MarkDeleted(u32),

    /// `expunge`.
    Expunge,

    /// `close`.
    Close,
}

/// How a search should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFailure {
    /// The server answers `NO`.
    Rejected,

    /// The connection drops.
    ConnectionLost,
}

/// Injected failures, keyed by UID so they follow a message across renumbering.
#[derive(Debug, Default)]
struct Failures {
    /// Searches fail this way.
    search: Option<SearchFailure>,

    /// Body fetches of these messages fail.
    fetch_body: HashSet<u32>,

    /// UID fetches of these messages return a response without UID.
    fetch_uid: HashSet<u32>,

    /// Copies of these messages fail.
    copy: HashSet<u32>,

    /// Flagging these messages fails.
    mark_deleted: HashSet<u32>,

    /// Expunge fails.
    expunge: bool,

    /// The next expunge fails.
    expunge_once: bool,
}

/// Shared mailbox state.
#[derive(Default)]
struct State {
    /// Selected mailbox contents in sequence order.
    inbox: Vec<FakeMessage>,

    /// Other folders' contents.
    folders: BTreeMap<String, Vec<Vec<u8>>>,

    /// Next UID to assign.
    next_uid: u32,

    /// Call log across all sessions.
    calls: Vec<Call>,

    /// Injected failures.
    failures: Failures,

    /// Whether the current session is logged out.
    closed: bool,

    /// Invoked after every search, successful or not.
    on_search: Option<Box<dyn FnMut() + Send>>,
}

/// Test handle to an in-memory mailbox.
#[derive(Clone, Default)]
pub struct FakeMailbox {
    /// Shared state.
    state: Arc<Mutex<State>>,
}

impl FakeMailbox {
    /// An empty mailbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the state.
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Append a message and return its UID.
    pub fn add_message(&self, from: &str, raw: impl Into<Vec<u8>>) -> u32 {
        let mut state = self.state();
        state.next_uid += 1;
        let uid = state.next_uid;
        state.inbox.push(FakeMessage {
            uid,
            from: from.to_owned(),
            raw: raw.into(),
            deleted: false,
        });
        uid
    }

    /// Open a new session on this mailbox.
    pub fn session(&self) -> FakeSession {
        self.state().closed = false;
        FakeSession {
            mailbox: self.clone(),
        }
    }

    /// The calls made so far.
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// UIDs left in the selected mailbox, in sequence order.
    pub fn inbox_uids(&self) -> Vec<u32> {
        self.state().inbox.iter().map(|message| message.uid).collect()
    }

    /// Messages copied into `folder`.
    pub fn folder(&self, folder: &str) -> Vec<Vec<u8>> {
        self.state().folders.get(folder).cloned().unwrap_or_default()
    }

    /// Number of `close` calls recorded.
    pub fn close_count(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| **call == Call::Close)
            .count()
    }

    /// Make searches fail.
    pub fn fail_search(&self, failure: SearchFailure) {
        self.state().failures.search = Some(failure);
    }

    /// Make searches succeed again.
    pub fn heal_search(&self) {
        self.state().failures.search = None;
    }

    /// Make body fetches of `uid` fail.
    pub fn fail_fetch_body(&self, uid: u32) {
        self.state().failures.fetch_body.insert(uid);
    }

    /// Make UID fetches of `uid` come back without a UID.
    pub fn fail_fetch_uid(&self, uid: u32) {
        self.state().failures.fetch_uid.insert(uid);
    }

    /// Make copies of `uid` fail.
    pub fn fail_copy(&self, uid: u32) {
        self.state().failures.copy.insert(uid);
    }

    /// Make flagging `uid` fail.
    pub fn fail_mark_deleted(&self, uid: u32) {
        self.state().failures.mark_deleted.insert(uid);
    }

    /// Make expunge fail.
    pub fn fail_expunge(&self) {
        self.state().failures.expunge = true;
    }

    /// Make only the next expunge fail.
    pub fn fail_expunge_once(&self) {
        self.state().failures.expunge_once = true;
    }

    /// Make every further call on the current session fail as if the connection dropped.
    pub fn drop_connection(&self) {
        self.state().closed = true;
    }

    /// Run `hook` after every search.
    pub fn on_search(&self, hook: impl FnMut() + Send + 'static) {
        self.state().on_search = Some(Box::new(hook));
    }
}

/// A [`MailSession`] on a [`FakeMailbox`].
pub struct FakeSession {
    /// The backing mailbox.
    mailbox: FakeMailbox,
}

impl FakeSession {
    /// The backing mailbox.
    pub fn mailbox(&self) -> &FakeMailbox {
        &self.mailbox
    }

    /// Record `call` and fail if the session is closed.
    fn begin(&self, call: Call) -> Result<MutexGuard<'_, State>, Error> {
        let mut state = self.mailbox.state();
        state.calls.push(call);
        if state.closed {
            return Err(Error::Closed);
        }
        Ok(state)
    }
}

/// A server `NO` answer for `command`.
fn rejected(command: Command) -> Error {
    Error::Protocol {
        command,
        source: async_imap::error::Error::No(format!("{command} rejected by fake server")),
    }
}

/// The message at `seq`, if any.
fn at(state: &State, seq: MessageRef) -> Option<&FakeMessage> {
    state.inbox.get(seq.get() as usize - 1)
}

impl MailSession for FakeSession {
    async fn search(&mut self, filter: &SearchFilter) -> Result<SearchResult, Error> {
        let mut state = self.begin(Call::Search(filter.sender().to_owned()))?;
        let mut hook = state.on_search.take();
        let result = match state.failures.search {
            Some(SearchFailure::Rejected) => Err(rejected(Command::Search)),
            Some(SearchFailure::ConnectionLost) => Err(Error::Protocol {
                command: Command::Search,
                source: async_imap::error::Error::ConnectionLost,
            }),
            None => Ok(SearchResult::from_unordered(
                state
                    .inbox
                    .iter()
                    .zip(1..)
                    .filter(|(message, _)| message.from.eq_ignore_ascii_case(filter.sender()))
                    .map(|(_, seq)| seq),
            )),
        };
        drop(state);

        if let Some(hook) = hook.as_mut() {
            hook();
        }
        let mut state = self.mailbox.state();
        if state.on_search.is_none() {
            state.on_search = hook;
        }

        result
    }

    async fn fetch_body(&mut self, message: MessageRef) -> Result<RawMessage, Error> {
        let state = self.begin(Call::FetchBody(message.get()))?;
        let fetch_error = |reason| Error::Fetch { message, reason };

        let stored = at(&state, message).ok_or_else(|| fetch_error(FetchFailure::NoData))?;
        if state.failures.fetch_body.contains(&stored.uid) {
            return Err(fetch_error(FetchFailure::Rejected(
                async_imap::error::Error::No("fetch rejected by fake server".into()),
            )));
        }
        if stored.raw.is_empty() {
            return Err(fetch_error(FetchFailure::EmptyBody));
        }
        Ok(RawMessage::new(stored.raw.clone()))
    }

    async fn fetch_uid(&mut self, message: MessageRef) -> Result<MessageUid, Error> {
        let state = self.begin(Call::FetchUid(message.get()))?;

        let stored = at(&state, message).ok_or(ParseError::MissingResponse { message })?;
        if state.failures.fetch_uid.contains(&stored.uid) {
            return Err(ParseError::MissingUid { message }.into());
        }
        Ok(MessageUid::new(stored.uid).ok_or(ParseError::ZeroUid { message })?)
    }

    async fn copy_to_folder(&mut self, uid: MessageUid, folder: &str) -> Result<(), Error> {
        let mut state = self.begin(Call::Copy {
            uid: uid.get(),
            folder: folder.to_owned(),
        })?;

        if state.failures.copy.contains(&uid.get()) {
            return Err(rejected(Command::Copy));
        }
        let raw = state
            .inbox
            .iter()
            .find(|message| message.uid == uid.get())
            .map(|message| message.raw.clone())
            .ok_or_else(|| rejected(Command::Copy))?;
        state.folders.entry(folder.to_owned()).or_default().push(raw);
        Ok(())
    }

    async fn mark_deleted(&mut self, uid: MessageUid) -> Result<(), Error> {
        let mut state = self.begin(Call::MarkDeleted(uid.get()))?;

        if state.failures.mark_deleted.contains(&uid.get()) {
            return Err(rejected(Command::Store));
        }
        if let Some(message) = state
            .inbox
            .iter_mut()
            .find(|message| message.uid == uid.get())
        {
            message.deleted = true;
        }
        Ok(())
    }

    async fn expunge(&mut self) -> Result<Vec<MessageRef>, Error> {
        let mut state = self.begin(Call::Expunge)?;

        if state.failures.expunge || core::mem::take(&mut state.failures.expunge_once) {
            return Err(rejected(Command::Expunge));
        }

        // Each reported number is relative to the mailbox after the previous removal.
        let mut expunged = Vec::new();
        let mut index = 0;
        while index < state.inbox.len() {
            if state.inbox[index].deleted {
                state.inbox.remove(index);
                expunged.extend(MessageRef::new(index as u32 + 1));
            } else {
                index += 1;
            }
        }
        Ok(expunged)
    }

    async fn close(&mut self) {
        let mut state = self.mailbox.state();
        state.calls.push(Call::Close);
        state.closed = true;
    }
}
