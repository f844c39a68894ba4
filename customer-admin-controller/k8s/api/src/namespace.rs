use crate::Namespace;

/// The lifecycle phase of a namespace, as reported in its status.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Active,
    Terminating,

    /// The namespace has no status yet or reports a phase this controller
    /// does not know about.
    Unknown,
}

// === impl Phase ===

impl Phase {
    pub fn of(ns: &Namespace) -> Self {
        ns.status
            .as_ref()
            .and_then(|status| status.phase.as_deref())
            .map(Self::from_str_phase)
            .unwrap_or(Self::Unknown)
    }

    fn from_str_phase(phase: &str) -> Self {
        match phase {
            "Active" => Self::Active,
            "Terminating" => Self::Terminating,
            _ => Self::Unknown,
        }
    }

    pub fn is_terminating(&self) -> bool {
        matches!(self, Self::Terminating)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => "Active".fmt(f),
            Self::Terminating => "Terminating".fmt(f),
            Self::Unknown => "Unknown".fmt(f),
        }
    }
}
