//! `Range` / `Content-Range` headers of the table API.

use std::fmt;
use std::str::FromStr;

/// Item range of a request for the 1-indexed `page` of `page_size` items,
/// formatted for the `Range` header (`"from-to"`, both inclusive).
pub fn page_range(page: u32, page_size: u32) -> String {
    let from = u64::from(page.saturating_sub(1)) * u64::from(page_size);
    let to = from + u64::from(page_size.max(1)) - 1;
    format!("{from}-{to}")
}

/// Parsed `Content-Range` response header, e.g. `0-9/25` or `*/0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    /// Inclusive item bounds; `None` when the page is empty.
    pub bounds: Option<(u64, u64)>,
    /// Total item count; `None` when the server did not count.
    pub total: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Malformed Content-Range header: {0}")]
pub struct ContentRangeError(String);

impl FromStr for ContentRange {
    type Err = ContentRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ContentRangeError(s.to_string());

        let s = s.trim();
        let s = s.strip_prefix("items ").unwrap_or(s);
        let (range, total) = s.split_once('/').ok_or_else(malformed)?;

        let total = match total {
            "*" => None,
            n => Some(n.parse().map_err(|_| malformed())?),
        };

        let bounds = match range {
            "*" => None,
            r => {
                let (from, to) = r.split_once('-').ok_or_else(malformed)?;
                let from = from.parse().map_err(|_| malformed())?;
                let to = to.parse().map_err(|_| malformed())?;
                Some((from, to))
            }
        };

        Ok(Self { bounds, total })
    }
}

impl fmt::Display for ContentRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bounds {
            Some((from, to)) => write!(f, "{from}-{to}/")?,
            None => f.write_str("*/")?,
        }
        match self.total {
            Some(total) => write!(f, "{total}"),
            None => f.write_str("*"),
        }
    }
}
