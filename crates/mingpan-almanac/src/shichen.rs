//! Shichen Resolver
//!
//! Maps a time of day onto the 12 traditional double-hours (子..亥) with
//! quarter ("ke") resolution. 子 starts at 23:00, so each branch covers the
//! two civil hours `[2i - 1, 2i + 1)`.
//!
//! The resolver is astrologically defined over *true solar time*; the
//! validator always feeds it the output of the solar corrector, never the
//! raw civil time.

use serde::{Deserialize, Serialize};
use std::fmt;

use mingpan_core::{EngineError, Result};

/// One of the 12 earthly branches, in fixed cycle order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Branch {
    Zi,
    Chou,
    Yin,
    Mao,
    Chen,
    Si,
    Wu,
    Wei,
    Shen,
    You,
    Xu,
    Hai,
}

impl Branch {
    pub const ALL: [Branch; 12] = [
        Branch::Zi,
        Branch::Chou,
        Branch::Yin,
        Branch::Mao,
        Branch::Chen,
        Branch::Si,
        Branch::Wu,
        Branch::Wei,
        Branch::Shen,
        Branch::You,
        Branch::Xu,
        Branch::Hai,
    ];

    const SYMBOLS: [char; 12] = [
        '子', '丑', '寅', '卯', '辰', '巳', '午', '未', '申', '酉', '戌', '亥',
    ];

    /// Position in the 12-branch cycle, 子 = 0
    pub fn index(self) -> usize {
        self as usize
    }

    /// Branch at a cycle position, reduced mod 12
    pub fn from_index(index: usize) -> Branch {
        Self::ALL[index % 12]
    }

    /// The branch's Chinese symbol
    pub fn symbol(self) -> char {
        Self::SYMBOLS[self.index()]
    }

    pub fn from_symbol(symbol: char) -> Option<Branch> {
        Self::SYMBOLS
            .iter()
            .position(|&s| s == symbol)
            .map(Self::from_index)
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Quarter-hour subdivision within a shichen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quarter {
    /// Minutes 0-14
    Initial,
    /// Minutes 15-29
    First,
    /// Minutes 30-44
    Second,
    /// Minutes 45-59
    Third,
}

impl Quarter {
    pub const ALL: [Quarter; 4] = [Quarter::Initial, Quarter::First, Quarter::Second, Quarter::Third];

    const LABELS: [&'static str; 4] = ["初刻", "一刻", "二刻", "三刻"];

    pub fn label(self) -> &'static str {
        Self::LABELS[self as usize]
    }

    fn from_minute(minute: u32) -> Quarter {
        Self::ALL[(minute / 15) as usize]
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A resolved double-hour with quarter precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shichen {
    pub branch: Branch,
    pub quarter: Quarter,
}

impl Shichen {
    /// Full display form, e.g. "午时二刻"
    pub fn display_full(&self) -> String {
        format!("{}时{}", self.branch, self.quarter)
    }

    /// Simple display form with quarter stripped, e.g. "午时"
    pub fn display_simple(&self) -> String {
        format!("{}时", self.branch)
    }
}

impl fmt::Display for Shichen {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}时{}", self.branch, self.quarter)
    }
}

fn check_clock(hour: u32, minute: u32) -> Result<()> {
    if hour > 23 {
        return Err(EngineError::range("hour", format!("{} outside 0..=23", hour)));
    }
    if minute > 59 {
        return Err(EngineError::range("minute", format!("{} outside 0..=59", minute)));
    }
    Ok(())
}

/// Resolve a time of day into branch and quarter
pub fn resolve(hour: u32, minute: u32) -> Result<Shichen> {
    check_clock(hour, minute)?;
    Ok(Shichen {
        branch: Branch::from_index(((hour + 1) / 2) as usize),
        quarter: Quarter::from_minute(minute),
    })
}

/// Resolve a whole hour into its branch, ignoring quarter detail
pub fn resolve_simple(hour: u32) -> Result<Branch> {
    check_clock(hour, 0)?;
    Ok(Branch::from_index(((hour + 1) / 2) as usize))
}

/// Normalize a shichen token to its bare branch.
///
/// Accepts the bare symbol ("午"), the simple form ("午时"), and the full
/// form with any quarter suffix ("午时二刻"). Anything else is an
/// [`EngineError::UnrecognizedShichenToken`]; tokens are never silently
/// defaulted.
pub fn normalize(token: &str) -> Result<Branch> {
    let mut rest = token.trim();
    for quarter in Quarter::ALL {
        if let Some(stripped) = rest.strip_suffix(quarter.label()) {
            rest = stripped;
            break;
        }
    }
    rest = rest.strip_suffix('时').unwrap_or(rest);

    let mut chars = rest.chars();
    match (chars.next().and_then(Branch::from_symbol), chars.next()) {
        (Some(branch), None) => Ok(branch),
        _ => Err(EngineError::UnrecognizedShichenToken {
            token: token.to_string(),
        }),
    }
}
