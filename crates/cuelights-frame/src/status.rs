//! The closed set of statuses a channel can be in.
//!
//! Codes are assigned in declaration order starting at 0 and travel on the
//! wire as a single ASCII digit, so a registry holds at most ten statuses.

use crate::error::{FrameError, Result};

/// Channel and status values are single decimal digits on the wire.
pub const MAX_WIRE_VALUES: usize = 10;

/// One state a channel can be set to or report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    code: u8,
    label: String,
    colour: String,
    settable: bool,
}

impl Status {
    /// A status operators may send, to one channel or to all of them.
    ///
    /// The code is assigned when the status is added to a registry.
    pub fn new(label: impl Into<String>, colour: impl Into<String>) -> Self {
        Self {
            code: 0,
            label: label.into(),
            colour: colour.into(),
            settable: true,
        }
    }

    /// Mark this status as reported by the device only; operators do not
    /// send it.
    pub fn report_only(mut self) -> Self {
        self.settable = false;
        self
    }

    /// Wire code of this status.
    pub fn code(&self) -> u8 {
        self.code
    }

    /// Display label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Display colour name.
    pub fn colour(&self) -> &str {
        &self.colour
    }

    /// Whether operators may send this status.
    pub fn is_settable(&self) -> bool {
        self.settable
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label)
    }
}

/// Ordered, immutable set of valid statuses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRegistry {
    statuses: Vec<Status>,
}

impl StatusRegistry {
    /// Build a registry, numbering statuses in the order given.
    ///
    /// Fails if the set is empty, too large for a single wire digit, or
    /// contains two statuses with the same label.
    pub fn new(statuses: impl IntoIterator<Item = Status>) -> Result<Self> {
        let mut statuses: Vec<Status> = statuses.into_iter().collect();

        if statuses.is_empty() {
            return Err(FrameError::InvalidRegistry(
                "at least one status is required".to_string(),
            ));
        }
        if statuses.len() > MAX_WIRE_VALUES {
            return Err(FrameError::InvalidRegistry(format!(
                "{} statuses do not fit a single digit (max {MAX_WIRE_VALUES})",
                statuses.len()
            )));
        }

        for (code, status) in statuses.iter_mut().enumerate() {
            status.code = code as u8;
        }

        for (i, status) in statuses.iter().enumerate() {
            if statuses[..i]
                .iter()
                .any(|other| other.label.eq_ignore_ascii_case(&status.label))
            {
                return Err(FrameError::InvalidRegistry(format!(
                    "duplicate status label {:?}",
                    status.label
                )));
            }
        }

        Ok(Self { statuses })
    }

    /// All statuses, ordered by code.
    pub fn all_statuses(&self) -> &[Status] {
        &self.statuses
    }

    /// Number of statuses.
    pub fn num_statuses(&self) -> usize {
        self.statuses.len()
    }

    /// The reset status every channel starts in.
    pub fn first(&self) -> &Status {
        &self.statuses[0]
    }

    /// Look up a status by wire code.
    pub fn get(&self, code: u8) -> Option<&Status> {
        self.statuses.get(usize::from(code))
    }

    /// Look up a status by label (case-insensitive) or by numeric code.
    pub fn find(&self, name: &str) -> Option<&Status> {
        let name = name.trim();
        self.statuses
            .iter()
            .find(|status| status.label.eq_ignore_ascii_case(name))
            .or_else(|| name.parse::<u8>().ok().and_then(|code| self.get(code)))
    }

    /// Statuses operators may send.
    pub fn settable_statuses(&self) -> impl Iterator<Item = &Status> {
        self.statuses.iter().filter(|status| status.settable)
    }
}

impl Default for StatusRegistry {
    /// Reset, Standby, Ready and Go.
    fn default() -> Self {
        Self {
            statuses: vec![
                Status {
                    code: 0,
                    label: "Reset".to_string(),
                    colour: "black".to_string(),
                    settable: true,
                },
                Status {
                    code: 1,
                    label: "Standby".to_string(),
                    colour: "red".to_string(),
                    settable: true,
                },
                Status {
                    code: 2,
                    label: "Ready".to_string(),
                    colour: "red".to_string(),
                    settable: false,
                },
                Status {
                    code: 3,
                    label: "Go".to_string(),
                    colour: "green".to_string(),
                    settable: true,
                },
            ],
        }
    }
}
