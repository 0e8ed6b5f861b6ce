//! Run context
//!
//! A [`RunContext`] describes where the importer currently is: which run
//! mode, file, document, channel, operation, parameter or message. Nested
//! steps derive a child context and pass it down; the child is dropped when
//! the step returns, on success and on error alike.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use asyncport_core::Direction;

/// Import run mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Import into prefixed test domains, verify, then delete them
    TestMode,
    /// Like `TestMode` but the test domains are kept
    TestModeKeep,
    /// Full test sequence, then import into the real domains
    ReleaseMode,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TestMode => "test_mode",
            Self::TestModeKeep => "test_mode_keep",
            Self::ReleaseMode => "release_mode",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "test_mode" | "test" => Ok(Self::TestMode),
            "test_mode_keep" | "test_keep" => Ok(Self::TestModeKeep),
            "release_mode" | "release" => Ok(Self::ReleaseMode),
            _ => Err(format!(
                "unknown run mode '{s}' (expected test_mode, test_mode_keep, release_mode)"
            )),
        }
    }
}

/// One level of the run context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    RunMode(RunMode),
    ApiFile(String),
    Document { title: String, version: String },
    Channel { topic: String },
    Operation { direction: Direction },
    Parameter { name: String },
    Message { name: String },
}

impl Frame {
    fn key(&self) -> &'static str {
        match self {
            Frame::RunMode(_) => "mode",
            Frame::ApiFile(_) => "file",
            Frame::Document { .. } => "document",
            Frame::Channel { .. } => "channel",
            Frame::Operation { .. } => "operation",
            Frame::Parameter { .. } => "parameter",
            Frame::Message { .. } => "message",
        }
    }

    fn value(&self) -> String {
        match self {
            Frame::RunMode(mode) => mode.to_string(),
            Frame::ApiFile(path) => path.clone(),
            Frame::Document { title, version } => format!("{title}@{version}"),
            Frame::Channel { topic } => topic.clone(),
            Frame::Operation { direction } => direction.to_string(),
            Frame::Parameter { name } => name.clone(),
            Frame::Message { name } => name.clone(),
        }
    }
}

/// Ordered key/value view of a run context, attached to summary entries and errors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextSnapshot(IndexMap<String, String>);

impl ContextSnapshot {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for ContextSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.0 {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{key}={value}")?;
            first = false;
        }
        Ok(())
    }
}

/// Immutable stack of frames threaded through every reconciliation call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContext {
    frames: Vec<Frame>,
}

impl RunContext {
    /// Empty root context
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a nested context
    #[must_use]
    pub fn child(&self, frame: Frame) -> Self {
        let mut frames = self.frames.clone();
        frames.push(frame);
        Self { frames }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Innermost run mode, if any
    pub fn mode(&self) -> Option<RunMode> {
        self.frames.iter().rev().find_map(|frame| match frame {
            Frame::RunMode(mode) => Some(*mode),
            _ => None,
        })
    }

    /// Key/value view; an inner frame replaces an outer frame of the same kind
    pub fn snapshot(&self) -> ContextSnapshot {
        let mut map = IndexMap::new();
        for frame in &self.frames {
            map.insert(frame.key().to_string(), frame.value());
        }
        ContextSnapshot(map)
    }
}

impl fmt::Display for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.snapshot().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document_context() -> RunContext {
        RunContext::new()
            .child(Frame::RunMode(RunMode::TestMode))
            .child(Frame::ApiFile("orders.yaml".to_string()))
            .child(Frame::Document {
                title: "Orders".to_string(),
                version: "1.0.0".to_string(),
            })
    }

    #[test]
    fn test_child_does_not_modify_parent() {
        let parent = document_context();
        let child = parent.child(Frame::Channel {
            topic: "orders/created".to_string(),
        });

        assert_eq!(parent.frames().len(), 3);
        assert_eq!(child.frames().len(), 4);
        assert_eq!(child.snapshot().get("channel"), Some("orders/created"));
        assert_eq!(parent.snapshot().get("channel"), None);
    }

    #[test]
    fn test_display() {
        let ctx = document_context()
            .child(Frame::Channel {
                topic: "orders/{region}".to_string(),
            })
            .child(Frame::Operation {
                direction: Direction::Subscribe,
            });

        insta::assert_snapshot!(
            ctx.to_string(),
            @"mode=test_mode file=orders.yaml document=Orders@1.0.0 channel=orders/{region} operation=subscribe"
        );
    }

    #[test]
    fn test_inner_mode_wins() {
        let ctx = RunContext::new()
            .child(Frame::RunMode(RunMode::ReleaseMode))
            .child(Frame::RunMode(RunMode::TestMode));

        assert_eq!(ctx.mode(), Some(RunMode::TestMode));
        assert_eq!(ctx.snapshot().get("mode"), Some("test_mode"));
        assert_eq!(RunContext::new().mode(), None);
    }

    #[test]
    fn test_run_mode_from_str() {
        assert_eq!("release_mode".parse::<RunMode>().unwrap(), RunMode::ReleaseMode);
        assert_eq!("TEST-MODE-KEEP".parse::<RunMode>().unwrap(), RunMode::TestModeKeep);
        assert!("deploy".parse::<RunMode>().is_err());
    }
}
