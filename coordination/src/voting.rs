//! Vote extraction and tabulation.
//!
//! Extraction is a plain substring scan, not language understanding: the
//! rightmost alive name in the utterance is the vote. Tabulation keeps the
//! candidates in roster order and breaks ties in favour of the first
//! maximal candidate in that order.

/// Find the vote in an utterance.
///
/// Matching is case-insensitive and does not look at word boundaries. The
/// name whose last occurrence starts furthest right wins; at the same
/// start position the longer name wins. Returns `None` when no candidate
/// appears.
pub fn extract_vote(utterance: &str, candidates: &[String]) -> Option<String> {
    let text = utterance.to_lowercase();
    candidates
        .iter()
        .filter(|name| !name.is_empty())
        .filter_map(|name| {
            let name = name.to_lowercase();
            text.rfind(&name).map(|pos| (pos, name.len(), name))
        })
        .max_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)))
        .map(|(_, _, name)| name)
}

/// Vote counts for one voting phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteTally {
    counts: Vec<(String, u32)>,
}

impl VoteTally {
    /// Start a tally with every candidate at zero, in the given order.
    pub fn new(candidates: &[String]) -> Self {
        Self {
            counts: candidates.iter().map(|c| (c.to_lowercase(), 0)).collect(),
        }
    }

    /// Add one vote. Returns `false` if `name` is not a candidate.
    pub fn record(&mut self, name: &str) -> bool {
        let name = name.to_lowercase();
        match self.counts.iter_mut().find(|(c, _)| *c == name) {
            Some((_, count)) => {
                *count += 1;
                true
            }
            None => false,
        }
    }

    pub fn count(&self, name: &str) -> u32 {
        let name = name.to_lowercase();
        self.counts
            .iter()
            .find(|(c, _)| *c == name)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().map(|(_, n)| n).sum()
    }

    pub fn entries(&self) -> &[(String, u32)] {
        &self.counts
    }

    pub fn into_entries(self) -> Vec<(String, u32)> {
        self.counts
    }

    fn max_count(&self) -> Option<u32> {
        self.counts.iter().map(|(_, n)| *n).max()
    }

    /// First candidate with the highest count.
    ///
    /// Defined even when nobody received a vote: every candidate is then
    /// tied at zero and the first one is returned. `None` only for an
    /// empty tally.
    pub fn leader(&self) -> Option<&str> {
        let max = self.max_count()?;
        self.counts
            .iter()
            .find(|(_, n)| *n == max)
            .map(|(c, _)| c.as_str())
    }

    /// Every candidate sharing the highest count, in order.
    pub fn tied_leaders(&self) -> Vec<&str> {
        let Some(max) = self.max_count() else {
            return Vec::new();
        };
        self.counts
            .iter()
            .filter(|(_, n)| *n == max)
            .map(|(c, _)| c.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_rightmost_name_wins() {
        let alive = names(&["emily", "kyle", "sophia"]);
        assert_eq!(
            extract_vote("Emily: I first thought Kyle, but I vote Sophia.", &alive),
            Some("sophia".to_string())
        );
        assert_eq!(
            extract_vote("Emily: Sophia is fine. I vote for KYLE", &alive),
            Some("kyle".to_string())
        );
    }

    #[test]
    fn test_speaker_prefix_counts_as_a_match() {
        let alive = names(&["emily", "kyle"]);
        assert_eq!(
            extract_vote("Emily: I abstain.", &alive),
            Some("emily".to_string())
        );
    }

    #[test]
    fn test_last_occurrence_of_each_name_is_used() {
        let alive = names(&["emily", "kyle"]);
        // Kyle appears first but also last.
        assert_eq!(
            extract_vote("kyle or emily? kyle.", &alive),
            Some("kyle".to_string())
        );
    }

    #[test]
    fn test_longer_name_wins_at_same_position() {
        let alive = names(&["ann", "anna"]);
        assert_eq!(
            extract_vote("I vote anna", &alive),
            Some("anna".to_string())
        );
    }

    #[test]
    fn test_no_match() {
        let alive = names(&["emily", "kyle"]);
        assert_eq!(extract_vote("I have no idea.", &alive), None);
        assert_eq!(extract_vote("anything", &[]), None);
    }

    #[test]
    fn test_tally_first_maximal_wins() {
        let mut tally = VoteTally::new(&names(&["a", "b", "c"]));
        tally.record("c");
        tally.record("b");
        assert_eq!(tally.leader(), Some("b"));
        assert_eq!(tally.tied_leaders(), ["b", "c"]);
        tally.record("C");
        assert_eq!(tally.leader(), Some("c"));
        assert_eq!(tally.total(), 3);
    }

    #[test]
    fn test_tally_all_zero_still_has_leader() {
        let tally = VoteTally::new(&names(&["a", "b"]));
        assert_eq!(tally.leader(), Some("a"));
        assert_eq!(tally.tied_leaders().len(), 2);
        assert_eq!(VoteTally::default().leader(), None);
    }

    #[test]
    fn test_record_unknown_candidate() {
        let mut tally = VoteTally::new(&names(&["a"]));
        assert!(!tally.record("zed"));
        assert_eq!(tally.total(), 0);
        assert_eq!(tally.count("zed"), 0);
    }
}
