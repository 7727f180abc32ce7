//! Calendar selector shared by the store, projection and edit session.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Which record variant a calendar shows and creates.
///
/// Serialized as the `calendarId` discriminant of persisted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarKind {
    /// Generic ranged event with start/end.
    #[default]
    Default,
    /// Workout set pinned to a single date.
    Workout,
    /// Study session pinned to a single date.
    Study,
}

impl CalendarKind {
    /// All calendars in display order.
    pub const ALL: [CalendarKind; 3] = [Self::Default, Self::Workout, Self::Study];

    /// Stable wire label, identical to the persisted `calendarId`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Workout => "workout",
            Self::Study => "study",
        }
    }

    /// Parses a wire label. Surrounding whitespace and case are ignored.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "default" => Some(Self::Default),
            "workout" => Some(Self::Workout),
            "study" => Some(Self::Study),
            _ => None,
        }
    }
}

impl Display for CalendarKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
