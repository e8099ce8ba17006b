//! # Feed script module
//!
//! A feed script replays inbound messages at fixed times, standing in for a live transport. Each
//! entry has the form
//!
//! ```text
//! <time_s>: <json message>;
//! ```
//!
//! where `<json message>` is an [`InboundMsg`] encoded as JSON. Entries are released in the order
//! they appear in the script once their time has passed.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use regex::RegexBuilder;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use thiserror::Error;

// Internal
use comms_if::inbound::{InboundMsg, MsgParseError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A message which is scripted to be delivered at a specific time.
struct ScriptedMsg {
    /// The time the message is released at
    release_time_s: f64,

    msg: InboundMsg,
}

/// A parsed feed script.
///
/// Use [`FeedScript::get_pending`] to acquire the messages that are due.
pub struct FeedScript {
    msgs: VecDeque<ScriptedMsg>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum FeedScriptError {
    #[error("Could not find the script at {0}")]
    ScriptNotFound(String),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error("Script contains an invalid timestamp: {0}. Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script contains an invalid message at {0} s: {1}")]
    InvalidMsg(f64, MsgParseError),
}

/// Messages pending release from a script.
#[derive(Debug, PartialEq)]
pub enum PendingMsgs {
    None,
    Some(Vec<InboundMsg>),
    EndOfScript,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FeedScript {
    /// Load a feed script from the given path.
    pub fn load<P: AsRef<Path>>(script_path: P) -> Result<Self, FeedScriptError> {
        let path = script_path.as_ref();

        if !path.exists() {
            return Err(FeedScriptError::ScriptNotFound(
                path.to_string_lossy().into_owned(),
            ));
        }

        let script = fs::read_to_string(path).map_err(FeedScriptError::ScriptLoadError)?;

        Self::parse(&script)
    }

    /// Parse a feed script from its contents.
    pub fn parse(script: &str) -> Result<Self, FeedScriptError> {
        // The payload may span multiple lines, it runs until the terminating semicolon
        let re = RegexBuilder::new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .expect("feed script regex is valid");

        let mut msgs = VecDeque::new();

        for cap in re.captures_iter(script) {
            let time_str = &cap[1];
            let release_time_s: f64 = time_str
                .parse()
                .map_err(|_| FeedScriptError::InvalidTimestamp(time_str.to_string()))?;

            let msg = InboundMsg::from_json(&cap[3])
                .map_err(|e| FeedScriptError::InvalidMsg(release_time_s, e))?;

            msgs.push_back(ScriptedMsg {
                release_time_s,
                msg,
            });
        }

        if msgs.is_empty() {
            return Err(FeedScriptError::ScriptEmpty);
        }

        Ok(FeedScript { msgs })
    }

    /// Return the messages due for release at `current_time_s`.
    pub fn get_pending(&mut self, current_time_s: f64) -> PendingMsgs {
        if self.msgs.is_empty() {
            return PendingMsgs::EndOfScript;
        }

        let mut pending = vec![];

        while let Some(front) = self.msgs.front() {
            if front.release_time_s > current_time_s {
                break;
            }
            if let Some(m) = self.msgs.pop_front() {
                pending.push(m.msg);
            }
        }

        if pending.is_empty() {
            PendingMsgs::None
        } else {
            PendingMsgs::Some(pending)
        }
    }

    /// Get the number of messages remaining in the script
    pub fn get_num_msgs(&self) -> usize {
        self.msgs.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        self.msgs.back().map(|m| m.release_time_s).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::nav::Pose;

    const SCRIPT: &str = r#"
        0.0: {"Route": {"frame_id": "odom", "waypoints_m": [[0.0, 0.0], [10.0, 0.0]]}};
        0.5: {"Pose": {"position_m": [0.0, 0.0]}};
        0.5: {"Pose": {"position_m": [1.0, 0.0]}};
        2.0: "Stop";
    "#;

    #[test]
    fn test_pending_release() {
        let mut script = FeedScript::parse(SCRIPT).unwrap();

        assert_eq!(script.get_num_msgs(), 4);
        assert_eq!(script.get_duration(), 2.0);

        match script.get_pending(0.1) {
            PendingMsgs::Some(m) => assert_eq!(m[0].kind(), "Route"),
            p => panic!("Expected the route, got {:?}", p),
        }
        assert_eq!(script.get_pending(0.2), PendingMsgs::None);
        assert_eq!(
            script.get_pending(1.0),
            PendingMsgs::Some(vec![
                InboundMsg::Pose(Pose::from_position(0.0, 0.0)),
                InboundMsg::Pose(Pose::from_position(1.0, 0.0)),
            ])
        );
        assert_eq!(
            script.get_pending(2.0),
            PendingMsgs::Some(vec![InboundMsg::Stop])
        );
        assert_eq!(script.get_pending(3.0), PendingMsgs::EndOfScript);
    }

    #[test]
    fn test_bad_scripts() {
        assert!(matches!(
            FeedScript::parse("nothing to see here"),
            Err(FeedScriptError::ScriptEmpty)
        ));
        assert!(matches!(
            FeedScript::parse(r#"1.0: {"Teleport": [0.0, 0.0]};"#),
            Err(FeedScriptError::InvalidMsg(t, _)) if t == 1.0
        ));
        assert!(matches!(
            FeedScript::load("/definitely/not/a/script.nfs"),
            Err(FeedScriptError::ScriptNotFound(_))
        ));
    }
}
