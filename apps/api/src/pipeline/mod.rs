//! Recruitment pipeline: stage board and sourced-candidate import.

pub mod handlers;

use serde::{Deserialize, Serialize};

use crate::models::candidate::{Candidate, NewCandidate, PipelineStage};

/// One column of the pipeline board.
#[derive(Debug, Clone, Serialize)]
pub struct StageGroup {
    pub stage: PipelineStage,
    pub count: usize,
    pub candidates: Vec<Candidate>,
}

/// Groups candidates by stage. Every stage is present, in display order,
/// even when empty; candidates keep their input order inside a stage.
pub fn group_by_stage(candidates: Vec<Candidate>) -> Vec<StageGroup> {
    let mut groups: Vec<StageGroup> = PipelineStage::ALL
        .iter()
        .map(|&stage| StageGroup {
            stage,
            count: 0,
            candidates: Vec::new(),
        })
        .collect();

    for candidate in candidates {
        if let Some(group) = groups.iter_mut().find(|g| g.stage == candidate.stage) {
            group.count += 1;
            group.candidates.push(candidate);
        }
    }
    groups
}

// ────────────────────────────────────────────────────────────────────────────
// Sourced candidate import
// ────────────────────────────────────────────────────────────────────────────

/// A candidate card as captured from a job-board search result.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourcedCandidateCard {
    pub name: String,
    pub title: Option<String>,
    pub experience: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub imported: Vec<Candidate>,
    /// Zero-based positions of cards skipped for having no name.
    pub skipped: Vec<usize>,
}

/// Turns a card into a `sourced` candidate. Returns `None` when the card has no name.
pub fn card_to_candidate(card: SourcedCandidateCard) -> Option<NewCandidate> {
    let name = card.name.trim();
    if name.is_empty() {
        return None;
    }
    let (first_name, last_name) = match name.split_once(char::is_whitespace) {
        Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
        None => (name.to_string(), String::new()),
    };
    let clean = |v: Option<String>| {
        v.map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    Some(NewCandidate {
        first_name,
        last_name,
        current_designation: clean(card.title),
        experience: clean(card.experience),
        city: clean(card.location),
        stage: Some(PipelineStage::Sourced),
        ..Default::default()
    })
}

/// Splits a batch of cards into importable candidates and skipped positions.
pub fn prepare_import(cards: Vec<SourcedCandidateCard>) -> (Vec<NewCandidate>, Vec<usize>) {
    let mut accepted = Vec::new();
    let mut skipped = Vec::new();
    for (index, card) in cards.into_iter().enumerate() {
        match card_to_candidate(card) {
            Some(candidate) => accepted.push(candidate),
            None => skipped.push(index),
        }
    }
    (accepted, skipped)
}
