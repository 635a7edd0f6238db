//! Bio-text segment classifier.

use akari_core::Segment;

/// Keyword → segment table. Keys are lowercase single words.
///
/// The segment with the most keyword hits wins; ties go to the segment
/// listed first in [`PRIORITY`].
pub(crate) const LEXICON: &[(&str, Segment)] = &[
    // DeFi
    ("defi", Segment::Defi),
    ("yield", Segment::Defi),
    ("liquidity", Segment::Defi),
    ("amm", Segment::Defi),
    ("dex", Segment::Defi),
    ("lending", Segment::Defi),
    ("staking", Segment::Defi),
    ("restaking", Segment::Defi),
    ("stablecoin", Segment::Defi),
    ("stablecoins", Segment::Defi),
    ("farming", Segment::Defi),
    ("tvl", Segment::Defi),
    // Builders
    ("builder", Segment::Builder),
    ("building", Segment::Builder),
    ("dev", Segment::Builder),
    ("developer", Segment::Builder),
    ("engineer", Segment::Builder),
    ("solidity", Segment::Builder),
    ("rust", Segment::Builder),
    ("founder", Segment::Builder),
    ("cofounder", Segment::Builder),
    ("cto", Segment::Builder),
    ("protocol", Segment::Builder),
    ("shipping", Segment::Builder),
    // Investors
    ("investor", Segment::Investor),
    ("investing", Segment::Investor),
    ("vc", Segment::Investor),
    ("partner", Segment::Investor),
    ("capital", Segment::Investor),
    ("ventures", Segment::Investor),
    ("fund", Segment::Investor),
    ("angel", Segment::Investor),
    ("lp", Segment::Investor),
    ("portfolio", Segment::Investor),
    // Traders
    ("trader", Segment::Trader),
    ("trading", Segment::Trader),
    ("degen", Segment::Trader),
    ("perps", Segment::Trader),
    ("futures", Segment::Trader),
    ("charts", Segment::Trader),
    ("ta", Segment::Trader),
    ("alpha", Segment::Trader),
    ("leverage", Segment::Trader),
    ("memecoins", Segment::Trader),
    // Creators
    ("creator", Segment::Creator),
    ("content", Segment::Creator),
    ("writer", Segment::Creator),
    ("writing", Segment::Creator),
    ("podcast", Segment::Creator),
    ("host", Segment::Creator),
    ("youtube", Segment::Creator),
    ("newsletter", Segment::Creator),
    ("artist", Segment::Creator),
    ("memes", Segment::Creator),
];

const PRIORITY: [Segment; 5] = [
    Segment::Defi,
    Segment::Builder,
    Segment::Investor,
    Segment::Trader,
    Segment::Creator,
];

/// Classify a profile bio. Missing, empty, or unmatched text is
/// [`Segment::General`].
#[must_use]
pub fn classify_bio(bio: Option<&str>) -> Segment {
    let Some(text) = bio else {
        return Segment::General;
    };

    let mut hits = [0usize; PRIORITY.len()];
    for word in text.split_whitespace() {
        let w = word
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if w.is_empty() {
            continue;
        }
        if let Some(&(_, segment)) = LEXICON.iter().find(|(lex_word, _)| *lex_word == w) {
            if let Some(idx) = PRIORITY.iter().position(|s| *s == segment) {
                hits[idx] += 1;
            }
        }
    }

    let mut best: Option<(usize, usize)> = None;
    for (idx, &count) in hits.iter().enumerate() {
        if count > 0 && best.is_none_or(|(_, top)| count > top) {
            best = Some((idx, count));
        }
    }

    best.map_or(Segment::General, |(idx, _)| PRIORITY[idx])
}
