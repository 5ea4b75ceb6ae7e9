use crate::models::candidate::CandidateAnalysis;

/// Orders candidates by descending fit score. The sort is stable, so equal scores keep
/// the order in which records were produced. Never adds or drops a record.
pub fn rank(mut records: Vec<CandidateAnalysis>) -> Vec<CandidateAnalysis> {
    records.sort_by(|a, b| b.fit_score.cmp(&a.fit_score));
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn candidate(id: &str, fit_score: u8) -> CandidateAnalysis {
        CandidateAnalysis {
            id: id.to_string(),
            source_document_id: format!("doc-{id}"),
            candidate_name: id.to_uppercase(),
            email: None,
            phone: None,
            fit_score,
            skills: vec![],
            total_experience_years: 0.0,
            experience_breakdown: vec![],
            education: vec![],
            mismatches: vec![],
            strengths: vec![],
            raw_content: String::new(),
            analyzed_at: Utc::now(),
        }
    }

    fn ids(records: &[CandidateAnalysis]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_rank_descending_by_score() {
        let ranked = rank(vec![candidate("a", 40), candidate("b", 90), candidate("c", 65)]);
        assert_eq!(ids(&ranked), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_rank_is_stable_for_ties() {
        let ranked = rank(vec![
            candidate("first", 70),
            candidate("low", 10),
            candidate("second", 70),
            candidate("third", 70),
        ]);
        assert_eq!(ids(&ranked), vec!["first", "second", "third", "low"]);
    }

    #[test]
    fn test_rank_is_idempotent() {
        let once = rank(vec![
            candidate("a", 50),
            candidate("b", 50),
            candidate("c", 99),
            candidate("d", 0),
        ]);
        let twice = rank(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rank_is_a_permutation() {
        let input = vec![
            candidate("a", 12),
            candidate("b", 88),
            candidate("c", 12),
            candidate("d", 100),
            candidate("e", 55),
        ];
        let mut before: Vec<String> = input.iter().map(|r| r.id.clone()).collect();
        let ranked = rank(input);
        let mut after: Vec<String> = ranked.iter().map(|r| r.id.clone()).collect();
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[test]
    fn test_rank_empty() {
        assert!(rank(vec![]).is_empty());
    }
}
