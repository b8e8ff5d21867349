use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Header used to propagate request ids between services.
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Per-request identifier backed by a ULID.
///
/// Every context gets one on reset, either parsed from an inbound
/// `X-Request-ID` header or freshly generated.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(ulid::Ulid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// The nil id, used by idle contexts sitting in the pool.
    #[must_use]
    pub const fn nil() -> Self {
        Self(ulid::Ulid::nil())
    }

    /// Parse a header value; anything that is not a ULID yields a fresh id.
    #[must_use]
    pub fn from_header_or_new(header_value: Option<&str>) -> Self {
        header_value
            .and_then(|s| s.trim().parse::<RequestId>().ok())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ulid::Ulid::from_string(s).map(RequestId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_round_trip() {
        let id = RequestId::new();
        let parsed = RequestId::from_header_or_new(Some(&id.to_string()));
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_garbage_header_generates_new_id() {
        let id = RequestId::from_header_or_new(Some("not-a-ulid"));
        assert!(!id.is_nil());
    }

    #[test]
    fn test_nil() {
        assert!(RequestId::nil().is_nil());
    }
}
