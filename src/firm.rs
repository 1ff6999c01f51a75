// 🏦 Firm Model - the entities being ranked
//
// Firms are read-only on this side of the wire: wins, losses and totals
// change only on the server, in response to votes.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// IDENTITY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FirmId(pub i64);

impl fmt::Display for FirmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// FIRM TYPE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FirmType {
    HedgeFund,
    TradingFirm,
    GlobalBank,
    Bank,
    AssetManager,
    FinTech,

    /// Anything the server sends that we do not know yet
    Other(String),
}

impl FirmType {
    /// Every known category, in filter-tab order
    pub const KNOWN: [FirmType; 6] = [
        FirmType::HedgeFund,
        FirmType::TradingFirm,
        FirmType::GlobalBank,
        FirmType::Bank,
        FirmType::AssetManager,
        FirmType::FinTech,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            FirmType::HedgeFund => "Hedge Fund",
            FirmType::TradingFirm => "Trading Firm",
            FirmType::GlobalBank => "Global Bank",
            FirmType::Bank => "Bank",
            FirmType::AssetManager => "Asset Manager",
            FirmType::FinTech => "FinTech",
            FirmType::Other(name) => name.as_str(),
        }
    }
}

impl From<String> for FirmType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Hedge Fund" => FirmType::HedgeFund,
            "Trading Firm" => FirmType::TradingFirm,
            "Global Bank" => FirmType::GlobalBank,
            "Bank" => FirmType::Bank,
            "Asset Manager" => FirmType::AssetManager,
            "FinTech" => FirmType::FinTech,
            _ => FirmType::Other(value),
        }
    }
}

impl From<&str> for FirmType {
    fn from(value: &str) -> Self {
        FirmType::from(value.to_string())
    }
}

impl From<FirmType> for String {
    fn from(value: FirmType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for FirmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// FIRM
// ============================================================================

/// A ranked firm as served by `/api/firms`, `/api/firm/{id}` and `/api/matchup`
///
/// Matchup payloads only carry `id`, `name` and `type`, so the counters
/// default to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Firm {
    pub id: FirmId,
    pub name: String,
    #[serde(rename = "type")]
    pub firm_type: FirmType,
    #[serde(default)]
    pub wins: u64,
    #[serde(default)]
    pub losses: u64,
    #[serde(default)]
    pub total: u64,
}

impl Firm {
    pub fn new(id: i64, name: impl Into<String>, firm_type: FirmType) -> Self {
        Firm {
            id: FirmId(id),
            name: name.into(),
            firm_type,
            wins: 0,
            losses: 0,
            total: 0,
        }
    }

    pub fn with_record(mut self, wins: u64, losses: u64) -> Self {
        self.wins = wins;
        self.losses = losses;
        self.total = wins + losses;
        self
    }

    /// Win rate as a percentage rounded to one decimal, 0 when nobody voted
    pub fn win_rate(&self) -> f64 {
        win_rate(self.wins, self.total)
    }

    pub fn has_votes(&self) -> bool {
        self.total > 0
    }

    pub fn tier(&self) -> Option<WinRateTier> {
        if self.has_votes() {
            Some(WinRateTier::for_rate(self.win_rate()))
        } else {
            None
        }
    }
}

pub fn win_rate(wins: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let rate = wins as f64 / total as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}

// ============================================================================
// WIN RATE TIERS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinRateTier {
    /// 60% and above
    Strong,
    /// 40% up to 60%
    Even,
    /// below 40%
    Weak,
}

impl WinRateTier {
    pub fn for_rate(rate: f64) -> Self {
        if rate >= 60.0 {
            WinRateTier::Strong
        } else if rate >= 40.0 {
            WinRateTier::Even
        } else {
            WinRateTier::Weak
        }
    }
}

// ============================================================================
// CATEGORY FILTER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(FirmType),
}

impl CategoryFilter {
    /// `"all"` selects everything, anything else one category (any case)
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            return CategoryFilter::All;
        }
        let firm_type = FirmType::KNOWN
            .iter()
            .find(|known| known.as_str().eq_ignore_ascii_case(value))
            .cloned()
            .unwrap_or_else(|| FirmType::from(value));
        CategoryFilter::Only(firm_type)
    }

    pub fn matches(&self, firm: &Firm) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(firm_type) => &firm.firm_type == firm_type,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CategoryFilter::All => "All",
            CategoryFilter::Only(firm_type) => firm_type.as_str(),
        }
    }

    /// Filter tabs as shown in the firms list
    pub fn tabs() -> Vec<CategoryFilter> {
        let mut tabs = vec![CategoryFilter::All];
        tabs.extend(FirmType::KNOWN.iter().cloned().map(CategoryFilter::Only));
        tabs
    }
}

pub fn filter_firms(firms: &[Firm], filter: &CategoryFilter) -> Vec<Firm> {
    firms.iter().filter(|f| filter.matches(f)).cloned().collect()
}

// ============================================================================
// COMMENTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    /// The firm won the vote the comment belongs to
    Picked,
    /// The firm lost it
    Passed,
}

impl Sentiment {
    pub fn badge(&self) -> &'static str {
        match self {
            Sentiment::Picked => "✓ PICKED",
            Sentiment::Passed => "✗ PASSED",
        }
    }
}

const COMMENT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A vote rationale seen from one firm's side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub sentiment: Sentiment,
    #[serde(default)]
    pub other_firm: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Comment {
    pub fn posted_at(&self) -> Option<NaiveDateTime> {
        let raw = self.created_at.as_deref()?;
        NaiveDateTime::parse_from_str(raw, COMMENT_TIME_FORMAT).ok()
    }
}

/// Answer of `GET /api/firm/{id}`
#[derive(Debug, Clone, PartialEq)]
pub struct FirmDetail {
    pub firm: Firm,
    pub comments: Vec<Comment>,
}

impl FirmDetail {
    pub fn recent_comments(&self, limit: usize) -> &[Comment] {
        &self.comments[..self.comments.len().min(limit)]
    }
}

// ============================================================================
// MATCHUP
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Two distinct firms presented head to head
#[derive(Debug, Clone, PartialEq)]
pub struct Matchup {
    firms: [Firm; 2],
}

impl Matchup {
    /// Uses the first two firms; `None` when there are fewer than two
    /// or both share an id
    pub fn from_firms(firms: Vec<Firm>) -> Option<Self> {
        let mut iter = firms.into_iter();
        let left = iter.next()?;
        let right = iter.next()?;
        if left.id == right.id {
            return None;
        }
        Some(Matchup {
            firms: [left, right],
        })
    }

    pub fn left(&self) -> &Firm {
        &self.firms[0]
    }

    pub fn right(&self) -> &Firm {
        &self.firms[1]
    }

    pub fn firm(&self, side: Side) -> &Firm {
        match side {
            Side::Left => self.left(),
            Side::Right => self.right(),
        }
    }

    pub fn find(&self, id: FirmId) -> Option<&Firm> {
        self.firms.iter().find(|f| f.id == id)
    }

    pub fn contains(&self, id: FirmId) -> bool {
        self.find(id).is_some()
    }

    pub fn firms(&self) -> &[Firm] {
        &self.firms
    }
}

// ============================================================================
// TESTS
// ============================================================================
