//! Event subscription patterns.

use std::fmt;

use smol_str::SmolStr;

/// What a behavior subscribes to.
///
/// | Written as  | Pattern               | Matches                         |
/// |-------------|-----------------------|---------------------------------|
/// | `"insert.text"` | `Exact("insert.text")` | that type only             |
/// | `"drag.*"`  | `Prefix("drag.")`     | `drag.start`, `drag.drop`, …    |
/// | `"*"`       | `All`                 | every event                     |
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum EventPattern {
    Exact(SmolStr),
    Prefix(SmolStr),
    All,
}

impl EventPattern {
    pub fn parse(pattern: &str) -> Self {
        match pattern {
            "*" => EventPattern::All,
            p => match p.strip_suffix('*') {
                Some(prefix) => EventPattern::Prefix(SmolStr::new(prefix)),
                None => EventPattern::Exact(SmolStr::new(p)),
            },
        }
    }

    pub fn matches(&self, event_type: &str) -> bool {
        match self {
            EventPattern::Exact(name) => name == event_type,
            EventPattern::Prefix(prefix) => event_type.starts_with(prefix.as_str()),
            EventPattern::All => true,
        }
    }

    #[inline]
    pub fn is_wildcard(&self) -> bool {
        !matches!(self, EventPattern::Exact(_))
    }
}

impl From<&str> for EventPattern {
    fn from(pattern: &str) -> Self {
        Self::parse(pattern)
    }
}

impl fmt::Display for EventPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventPattern::Exact(name) => f.write_str(name),
            EventPattern::Prefix(prefix) => write!(f, "{prefix}*"),
            EventPattern::All => f.write_str("*"),
        }
    }
}
