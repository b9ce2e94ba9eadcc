//! Test-case suggestion for tasks that arrive without cases.
//!
//! Sources are tried in order: canned rules for well-known task shapes, the
//! oracle, then a generic placeholder suite.

use tracing::{info, warn};

use crate::core::cases::{canned_cases, fallback_cases};
use crate::core::types::TestCase;
use crate::io::oracle::CaseProposer;

/// Fewest oracle-proposed cases accepted before falling back.
pub const MIN_PROPOSED_CASES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseSource {
    Canned,
    Oracle,
    Fallback,
}

impl CaseSource {
    pub fn as_str(self) -> &'static str {
        match self {
            CaseSource::Canned => "canned",
            CaseSource::Oracle => "oracle",
            CaseSource::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestedCases {
    pub source: CaseSource,
    pub cases: Vec<TestCase>,
}

/// Suggest up to `count` cases for `task`. Without a proposer the oracle step
/// is skipped.
pub fn suggest_cases<P: CaseProposer + ?Sized>(
    task: &str,
    count: usize,
    proposer: Option<&P>,
) -> SuggestedCases {
    if let Some(cases) = canned_cases(task) {
        info!(cases = cases.len(), "using canned test cases");
        return SuggestedCases {
            source: CaseSource::Canned,
            cases,
        };
    }

    if let Some(proposer) = proposer {
        match proposer.propose_cases(task, count) {
            Ok(cases) if cases.len() >= MIN_PROPOSED_CASES => {
                return SuggestedCases {
                    source: CaseSource::Oracle,
                    cases,
                };
            }
            Ok(cases) => warn!(parsed = cases.len(), "too few proposed test cases"),
            Err(err) => warn!(err = %format!("{err:#}"), "test case proposal failed"),
        }
    }

    SuggestedCases {
        source: CaseSource::Fallback,
        cases: fallback_cases(count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};

    struct FixedProposer(Option<Vec<TestCase>>);

    impl CaseProposer for FixedProposer {
        fn propose_cases(&self, _task: &str, count: usize) -> Result<Vec<TestCase>> {
            self.0
                .clone()
                .map(|cases| cases.into_iter().take(count).collect())
                .ok_or_else(|| anyhow!("backend unavailable"))
        }
    }

    #[test]
    fn canned_rules_win_over_oracle() {
        let proposer = FixedProposer(Some(vec![TestCase::new("x", "y"); 3]));
        let suggested = suggest_cases("Reverse a string", 3, Some(&proposer));
        assert_eq!(suggested.source, CaseSource::Canned);
        assert_eq!(suggested.cases[0], TestCase::new("hello", "olleh"));
    }

    #[test]
    fn oracle_cases_used_when_enough_parsed() {
        let proposer = FixedProposer(Some(vec![
            TestCase::new("3", "9"),
            TestCase::new("4", "16"),
        ]));
        let suggested = suggest_cases("square a number", 3, Some(&proposer));
        assert_eq!(suggested.source, CaseSource::Oracle);
        assert_eq!(suggested.cases.len(), 2);
    }

    #[test]
    fn falls_back_on_too_few_or_failed_proposals() {
        let single = FixedProposer(Some(vec![TestCase::new("3", "9")]));
        let suggested = suggest_cases("square a number", 3, Some(&single));
        assert_eq!(suggested.source, CaseSource::Fallback);

        let failing = FixedProposer(None);
        let suggested = suggest_cases("square a number", 2, Some(&failing));
        assert_eq!(
            suggested.cases,
            vec![TestCase::new("", "output1"), TestCase::new("", "output2")]
        );
    }

    #[test]
    fn no_proposer_skips_oracle() {
        let suggested = suggest_cases::<FixedProposer>("square a number", 5, None);
        assert_eq!(suggested.source, CaseSource::Fallback);
        assert_eq!(suggested.cases.len(), 3);
    }
}
