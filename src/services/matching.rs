// SPDX-License-Identifier: MIT

//! Study partner matching.
//!
//! A single linear scan over candidate users, scoring each by the
//! set-intersection of subject lists: how many of my weak subjects they
//! are strong in, plus how many of their weak subjects I am strong in.

use crate::models::User;
use serde::Serialize;

/// How many partners a recommendation request returns at most.
pub const MAX_RECOMMENDATIONS: usize = 5;

/// A scored candidate partner.
#[derive(Debug, Clone, Serialize)]
pub struct PartnerScore {
    pub email: String,
    pub username: Option<String>,
    pub name: String,
    pub surname: String,
    pub grade: Option<String>,
    pub section: Option<String>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    /// Count of my weaknesses covered by their strengths
    pub can_help_you: u32,
    /// Count of their weaknesses covered by my strengths
    pub you_can_help: u32,
    pub score: u32,
}

/// Score candidates against a user and return the best matches.
///
/// Zero-score candidates are dropped; results are sorted by score
/// descending (ties by email for determinism) and truncated to `limit`.
pub fn score_partners(me: &User, candidates: &[User], limit: usize) -> Vec<PartnerScore> {
    let mut scored: Vec<PartnerScore> = candidates
        .iter()
        .map(|candidate| {
            let can_help_you = overlap(&candidate.strengths, &me.weaknesses);
            let you_can_help = overlap(&me.strengths, &candidate.weaknesses);
            PartnerScore {
                email: candidate.email.clone(),
                username: candidate.username.clone(),
                name: candidate.name.clone(),
                surname: candidate.surname.clone(),
                grade: candidate.grade.clone(),
                section: candidate.section.clone(),
                strengths: candidate.strengths.clone(),
                weaknesses: candidate.weaknesses.clone(),
                can_help_you,
                you_can_help,
                score: can_help_you + you_can_help,
            }
        })
        .filter(|p| p.score > 0)
        .collect();

    scored.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.email.cmp(&b.email)));
    scored.truncate(limit);
    scored
}

/// How many entries of `wanted` appear in `offered`.
fn overlap(offered: &[String], wanted: &[String]) -> u32 {
    wanted.iter().filter(|w| offered.contains(w)).count() as u32
}

/// Whole weeks elapsed since an RFC 3339 timestamp.
///
/// Returns 0 if the timestamp fails to parse, which keeps recommendations
/// gated rather than failing the request over a malformed legacy document.
pub fn weeks_since(created_at: &str, now: chrono::DateTime<chrono::Utc>) -> i64 {
    match chrono::DateTime::parse_from_rfc3339(created_at) {
        Ok(created) => {
            let elapsed = now.signed_duration_since(created.with_timezone(&chrono::Utc));
            elapsed.num_weeks().max(0)
        }
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::PasswordHash;

    fn user(email: &str, strengths: &[&str], weaknesses: &[&str]) -> User {
        User {
            email: email.to_string(),
            name: "Test".to_string(),
            surname: "User".to_string(),
            username: Some(email.split('@').next().unwrap().to_string()),
            roster_id: None,
            grade: Some("10".to_string()),
            section: Some("A".to_string()),
            password: PasswordHash {
                salt: String::new(),
                hash: String::new(),
            },
            strengths: strengths.iter().map(|s| s.to_string()).collect(),
            weaknesses: weaknesses.iter().map(|s| s.to_string()).collect(),
            profile_complete: true,
            is_admin: false,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            notifications: vec![],
            quizzes: vec![],
        }
    }

    #[test]
    fn test_mutual_help_scores_higher() {
        let me = user("me@x.test", &["Math"], &["Physics", "English"]);
        let mutual = user("mutual@x.test", &["Physics"], &["Math"]);
        let one_way = user("oneway@x.test", &["English"], &["History"]);

        let scored = score_partners(&me, &[one_way, mutual], MAX_RECOMMENDATIONS);

        assert_eq!(scored.len(), 2);
        assert_eq!(scored[0].email, "mutual@x.test");
        assert_eq!(scored[0].score, 2);
        assert_eq!(scored[0].can_help_you, 1);
        assert_eq!(scored[0].you_can_help, 1);
        assert_eq!(scored[1].score, 1);
    }

    #[test]
    fn test_zero_score_candidates_are_dropped() {
        let me = user("me@x.test", &["Math"], &["Physics"]);
        let unrelated = user("other@x.test", &["History"], &["Biology"]);

        let scored = score_partners(&me, &[unrelated], MAX_RECOMMENDATIONS);
        assert!(scored.is_empty());
    }

    #[test]
    fn test_results_truncated_to_limit() {
        let me = user("me@x.test", &[], &["Math"]);
        let candidates: Vec<User> = (0..8)
            .map(|i| user(&format!("c{}@x.test", i), &["Math"], &[]))
            .collect();

        let scored = score_partners(&me, &candidates, MAX_RECOMMENDATIONS);
        assert_eq!(scored.len(), MAX_RECOMMENDATIONS);
    }

    #[test]
    fn test_weeks_since() {
        let now = chrono::DateTime::parse_from_rfc3339("2026-02-01T00:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);

        assert_eq!(weeks_since("2026-01-01T00:00:00Z", now), 4);
        assert_eq!(weeks_since("2026-01-28T00:00:00Z", now), 0);
        assert_eq!(weeks_since("not-a-date", now), 0);
        // Clock skew: created in the future still yields 0
        assert_eq!(weeks_since("2026-03-01T00:00:00Z", now), 0);
    }
}
