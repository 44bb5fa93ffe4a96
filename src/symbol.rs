//! Document symbol parsing.
//!
//! Symbols look like `A/RES/77/16` (General Assembly resolution, session 77)
//! or `A/C.2/79/L.8` (committee draft). The year heuristic below only holds
//! for bodies with one session per year.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// First General Assembly session was held in 1946.
const SESSION_YEAR_BASE: i32 = 1945;

static RESOLUTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z])/RES/(\d+)/(\d+)$").expect("static regex"));
static SC_RESOLUTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^S/RES/(\d+)").expect("static regex"));
static DOCUMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z](?:/C\.\d+)?)/(\d+)/[A-Z]+\.(\d+)").expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Resolution,
    Document,
    Unknown,
}

/// Components of a document symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSymbol {
    pub body: String,
    pub session: Option<u32>,
    pub number: Option<u32>,
    pub kind: SymbolKind,
}

/// Parse a symbol into body, session and number.
pub fn parse_symbol(symbol: &str) -> ParsedSymbol {
    if let Some(caps) = RESOLUTION_RE.captures(symbol) {
        let body = caps[1].to_string();
        // Security Council has no sessions; reported as session 0
        let session = if body == "S" {
            Some(0)
        } else {
            caps[2].parse().ok()
        };
        return ParsedSymbol {
            body,
            session,
            number: caps[3].parse().ok(),
            kind: SymbolKind::Resolution,
        };
    }

    if let Some(caps) = SC_RESOLUTION_RE.captures(symbol) {
        return ParsedSymbol {
            body: "S".to_string(),
            session: None,
            number: caps[1].parse().ok(),
            kind: SymbolKind::Resolution,
        };
    }

    if let Some(caps) = DOCUMENT_RE.captures(symbol) {
        return ParsedSymbol {
            body: caps[1].to_string(),
            session: caps[2].parse().ok(),
            number: caps[3].parse().ok(),
            kind: SymbolKind::Document,
        };
    }

    ParsedSymbol {
        body: symbol.split('/').next().unwrap_or_default().to_string(),
        session: None,
        number: None,
        kind: SymbolKind::Unknown,
    }
}

/// Guess the year of a document from its session number.
///
/// Sessions below 200 count from 1945; a "session" above 1900 is already a
/// year. Anything else is unknown.
pub fn extract_year(symbol: &str) -> Option<i32> {
    let session = i32::try_from(parse_symbol(symbol).session?).ok()?;
    if session < 200 {
        Some(SESSION_YEAR_BASE + session)
    } else if session > 1900 {
        Some(session)
    } else {
        None
    }
}
