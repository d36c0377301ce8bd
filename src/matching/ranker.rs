use std::cmp::Reverse;

use super::matcher::{score, InterestProfile};

/// Anything that can be scored against a reference profile.
pub trait Candidate {
    fn candidate_id(&self) -> &str;
    fn interests(&self) -> &InterestProfile;
}

#[derive(Debug, Clone)]
pub struct Ranked<C> {
    pub candidate: C,
    pub score: u32,
    pub reasons: Vec<String>,
}

/// Scores every candidate, drops zero scores and the reference itself, and
/// sorts best first. Equal scores keep pool order.
pub fn rank_candidates<C, I>(reference_id: &str, reference: &InterestProfile, pool: I) -> Vec<Ranked<C>>
where
    C: Candidate,
    I: IntoIterator<Item = C>,
{
    let mut ranked: Vec<Ranked<C>> = pool
        .into_iter()
        .filter(|candidate| candidate.candidate_id() != reference_id)
        .filter_map(|candidate| {
            let result = score(reference, candidate.interests());
            (result.score > 0).then(|| Ranked {
                candidate,
                score: result.score,
                reasons: result.reasons,
            })
        })
        .collect();

    ranked.sort_by_key(|r| Reverse(r.score));
    ranked
}
