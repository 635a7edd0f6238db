use serde::{Deserialize, Serialize};

/// Coarse audience category assigned to a global circle member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    Defi,
    Builder,
    Investor,
    Trader,
    Creator,
    General,
}

impl Segment {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Segment::Defi => "defi",
            Segment::Builder => "builder",
            Segment::Investor => "investor",
            Segment::Trader => "trader",
            Segment::Creator => "creator",
            Segment::General => "general",
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
