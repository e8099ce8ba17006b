//! # Inbox
//!
//! Sources of inbound messages. The executable drains its inbox once at the start of each cycle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use comms_if::inbound::InboundMsg;
use log::info;
use thiserror::Error;
use util::feed_script::{FeedScript, PendingMsgs};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A source of inbound messages.
pub trait Inbox {
    /// Receive the next queued message, or `None` if no more messages are queued at the moment.
    fn receive(&mut self) -> Result<Option<InboundMsg>, InboxError>;
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum InboxError {
    #[error("All senders to the inbox have disconnected")]
    Disconnected,

    #[error("The end of the feed script has been reached")]
    EndOfScript,
}

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// An inbox fed by other threads through a channel.
pub struct ChannelInbox {
    rx: Receiver<InboundMsg>,

    disconnect_reported: bool,
}

/// An inbox which replays a feed script against a clock.
pub struct ScriptInbox {
    script: FeedScript,

    /// Messages released by the script but not yet received
    ready: VecDeque<InboundMsg>,

    /// Source of the current time in seconds
    clock: Box<dyn FnMut() -> f64 + Send>,

    end_reported: bool,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl ChannelInbox {
    /// Create a new inbox, returning the sender used to feed it.
    pub fn new() -> (Sender<InboundMsg>, Self) {
        let (tx, rx) = mpsc::channel();
        (
            tx,
            Self {
                rx,
                disconnect_reported: false,
            },
        )
    }
}

impl Inbox for ChannelInbox {
    /// Disconnection of the senders is reported once, after which the inbox just appears empty.
    fn receive(&mut self) -> Result<Option<InboundMsg>, InboxError> {
        match self.rx.try_recv() {
            Ok(msg) => Ok(Some(msg)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                if self.disconnect_reported {
                    Ok(None)
                } else {
                    self.disconnect_reported = true;
                    Err(InboxError::Disconnected)
                }
            }
        }
    }
}

impl ScriptInbox {
    /// Replay the script against the session clock.
    pub fn new(script: FeedScript) -> Self {
        Self::with_clock(script, util::session::get_elapsed_seconds)
    }

    /// Replay the script against a custom clock.
    pub fn with_clock<C>(script: FeedScript, clock: C) -> Self
    where
        C: FnMut() -> f64 + Send + 'static,
    {
        info!(
            "Feed script lasts {:.02} s and contains {} messages",
            script.get_duration(),
            script.get_num_msgs()
        );

        Self {
            script,
            ready: VecDeque::new(),
            clock: Box::new(clock),
            end_reported: false,
        }
    }
}

impl Inbox for ScriptInbox {
    /// Once every scripted message has been received the end of the script is reported once.
    fn receive(&mut self) -> Result<Option<InboundMsg>, InboxError> {
        if let Some(msg) = self.ready.pop_front() {
            return Ok(Some(msg));
        }

        match self.script.get_pending((self.clock)()) {
            PendingMsgs::None => Ok(None),
            PendingMsgs::Some(msgs) => {
                self.ready.extend(msgs);
                Ok(self.ready.pop_front())
            }
            PendingMsgs::EndOfScript => {
                if self.end_reported {
                    Ok(None)
                } else {
                    self.end_reported = true;
                    Err(InboxError::EndOfScript)
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::nav::Pose;
    use std::sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    };

    #[test]
    fn test_channel_inbox() {
        let (tx, mut inbox) = ChannelInbox::new();

        assert_eq!(inbox.receive(), Ok(None));

        tx.send(InboundMsg::Stop).unwrap();
        let handle = std::thread::spawn(move || {
            tx.send(InboundMsg::Pose(Pose::from_position(1.0, 1.0)))
                .unwrap();
        });
        handle.join().unwrap();

        assert_eq!(inbox.receive(), Ok(Some(InboundMsg::Stop)));
        assert_eq!(
            inbox.receive(),
            Ok(Some(InboundMsg::Pose(Pose::from_position(1.0, 1.0))))
        );

        // The sender was moved into the thread and dropped with it
        assert_eq!(inbox.receive(), Err(InboxError::Disconnected));
        assert_eq!(inbox.receive(), Ok(None));
    }

    #[test]
    fn test_script_inbox() {
        let script = FeedScript::parse(
            r#"
            0.0: {"Pose": {"position_m": [0.0, 0.0]}};
            1.0: {"Pose": {"position_m": [1.0, 0.0]}};
            1.0: "Stop";
            "#,
        )
        .unwrap();

        // Clock in milliseconds so it can be shared with the inbox
        let now_ms = Arc::new(AtomicU64::new(0));
        let clock_ms = now_ms.clone();
        let mut inbox = ScriptInbox::with_clock(script, move || {
            clock_ms.load(Ordering::SeqCst) as f64 / 1000.0
        });

        assert_eq!(
            inbox.receive(),
            Ok(Some(InboundMsg::Pose(Pose::from_position(0.0, 0.0))))
        );
        assert_eq!(inbox.receive(), Ok(None));

        now_ms.store(1500, Ordering::SeqCst);
        assert_eq!(
            inbox.receive(),
            Ok(Some(InboundMsg::Pose(Pose::from_position(1.0, 0.0))))
        );
        assert_eq!(inbox.receive(), Ok(Some(InboundMsg::Stop)));
        assert_eq!(inbox.receive(), Err(InboxError::EndOfScript));
        assert_eq!(inbox.receive(), Ok(None));
    }
}
