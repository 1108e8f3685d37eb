// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Deterministic autoregressive decoding
//!
//! Model-agnostic greedy and beam search. The caller supplies a step function
//! that maps a batch of equal-length token sequences to next-token logits, one
//! row per sequence. No sampling is ever performed.

use anyhow::Result;
use tracing::debug;

/// Decoding parameters for one generation call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodingParams {
    /// Maximum sequence length, counting the decoder start tokens
    pub max_length: usize,
    /// Beam width; 1 selects greedy decoding
    pub num_beams: usize,
    /// Exponent applied to hypothesis length when ranking finished beams
    pub length_penalty: f32,
}

impl DecodingParams {
    pub const fn greedy(max_length: usize) -> Self {
        Self {
            max_length,
            num_beams: 1,
            length_penalty: 1.0,
        }
    }

    pub const fn beam(max_length: usize, num_beams: usize) -> Self {
        Self {
            max_length,
            num_beams,
            length_penalty: 1.0,
        }
    }
}

/// Generate a token sequence
///
/// `prefix` holds the decoder start tokens. When `forced_first_token` is set it
/// is appended to the prefix without consulting the model, which is equivalent
/// to masking every other logit at the first step.
///
/// Returns the best sequence including the prefix (and forced token) and
/// excluding the end-of-sequence token.
pub fn generate<F>(
    prefix: &[u32],
    eos_token_id: u32,
    forced_first_token: Option<u32>,
    params: &DecodingParams,
    next_logits: F,
) -> Result<Vec<u32>>
where
    F: FnMut(&[Vec<u32>]) -> Result<Vec<Vec<f32>>>,
{
    if prefix.is_empty() {
        anyhow::bail!("Generation needs at least one decoder start token");
    }

    let mut start = prefix.to_vec();
    if let Some(token) = forced_first_token {
        if start.len() < params.max_length {
            start.push(token);
        }
    }

    if params.num_beams <= 1 {
        greedy_search(start, eos_token_id, params, next_logits)
    } else {
        beam_search(start, eos_token_id, params, next_logits)
    }
}

fn greedy_search<F>(
    mut tokens: Vec<u32>,
    eos_token_id: u32,
    params: &DecodingParams,
    mut next_logits: F,
) -> Result<Vec<u32>>
where
    F: FnMut(&[Vec<u32>]) -> Result<Vec<Vec<f32>>>,
{
    while tokens.len() < params.max_length {
        let logits = next_logits(std::slice::from_ref(&tokens))?;
        let row = logits
            .first()
            .ok_or_else(|| anyhow::anyhow!("Step function returned no logits"))?;

        let next_token = argmax(row)?;
        if next_token == eos_token_id {
            debug!("Greedy decoding hit EOS at length {}", tokens.len());
            break;
        }
        tokens.push(next_token);
    }

    Ok(tokens)
}

#[derive(Debug, Clone)]
struct Beam {
    tokens: Vec<u32>,
    /// Sum of token log-probabilities
    score: f32,
}

/// Finished hypotheses, best `capacity` kept, ranked by length-normalized score
struct Hypotheses {
    capacity: usize,
    length_penalty: f32,
    entries: Vec<(f32, Vec<u32>)>,
}

impl Hypotheses {
    fn new(capacity: usize, length_penalty: f32) -> Self {
        Self {
            capacity,
            length_penalty,
            entries: Vec::with_capacity(capacity + 1),
        }
    }

    fn normalized(&self, score: f32, len: usize) -> f32 {
        score / (len.max(1) as f32).powf(self.length_penalty)
    }

    fn add(&mut self, tokens: Vec<u32>, score: f32) {
        let normalized = self.normalized(score, tokens.len());
        self.entries.push((normalized, tokens));
        self.entries.sort_by(|a, b| b.0.total_cmp(&a.0));
        self.entries.truncate(self.capacity);
    }

    fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    fn worst(&self) -> Option<f32> {
        self.entries.last().map(|(score, _)| *score)
    }

    /// No running beam can still improve on the finished set
    fn is_done(&self, best_running_score: f32, cur_len: usize) -> bool {
        match self.worst() {
            Some(worst) if self.is_full() => self.normalized(best_running_score, cur_len) <= worst,
            _ => false,
        }
    }

    fn best(self) -> Option<Vec<u32>> {
        self.entries.into_iter().next().map(|(_, tokens)| tokens)
    }
}

fn beam_search<F>(
    start: Vec<u32>,
    eos_token_id: u32,
    params: &DecodingParams,
    mut next_logits: F,
) -> Result<Vec<u32>>
where
    F: FnMut(&[Vec<u32>]) -> Result<Vec<Vec<f32>>>,
{
    let num_beams = params.num_beams;
    let mut hypotheses = Hypotheses::new(num_beams, params.length_penalty);
    let mut beams = vec![Beam {
        tokens: start,
        score: 0.0,
    }];
    let mut done = false;

    while !beams.is_empty() && beams[0].tokens.len() < params.max_length {
        let sequences: Vec<Vec<u32>> = beams.iter().map(|b| b.tokens.clone()).collect();
        let logits = next_logits(&sequences)?;
        if logits.len() != beams.len() {
            anyhow::bail!(
                "Step function returned {} logit rows for {} beams",
                logits.len(),
                beams.len()
            );
        }

        // (score, beam index, token)
        let mut candidates: Vec<(f32, usize, u32)> = Vec::with_capacity(beams.len() * 2 * num_beams);
        for (index, (beam, row)) in beams.iter().zip(&logits).enumerate() {
            let log_probs = log_softmax(row);
            for (token, log_prob) in top_k(&log_probs, 2 * num_beams) {
                candidates.push((beam.score + log_prob, index, token));
            }
        }
        candidates.sort_by(|a, b| b.0.total_cmp(&a.0));

        let mut next_beams = Vec::with_capacity(num_beams);
        for (rank, (score, index, token)) in candidates.into_iter().enumerate() {
            if token == eos_token_id {
                // Only EOS among the top `num_beams` candidates closes a hypothesis
                if rank < num_beams {
                    hypotheses.add(beams[index].tokens.clone(), score);
                }
            } else {
                let mut tokens = beams[index].tokens.clone();
                tokens.push(token);
                next_beams.push(Beam { tokens, score });
            }

            if next_beams.len() == num_beams {
                break;
            }
        }

        beams = next_beams;

        if let Some(best) = beams.first() {
            if hypotheses.is_done(best.score, best.tokens.len()) {
                done = true;
                break;
            }
        }
    }

    if !done {
        for beam in beams {
            hypotheses.add(beam.tokens, beam.score);
        }
    }

    hypotheses
        .best()
        .ok_or_else(|| anyhow::anyhow!("Beam search produced no hypotheses"))
}

/// Index of the largest logit
pub fn argmax(logits: &[f32]) -> Result<u32> {
    logits
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(index, _)| index as u32)
        .ok_or_else(|| anyhow::anyhow!("Empty logits vector"))
}

pub fn log_softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return logits.to_vec();
    }
    let log_sum = logits.iter().map(|&x| (x - max).exp()).sum::<f32>().ln();
    logits.iter().map(|&x| x - max - log_sum).collect()
}

/// The `k` highest entries as (index, value), best first
fn top_k(values: &[f32], k: usize) -> Vec<(u32, f32)> {
    let mut indexed: Vec<(u32, f32)> = values
        .iter()
        .enumerate()
        .map(|(i, &v)| (i as u32, v))
        .collect();
    let k = k.min(indexed.len());
    if k == 0 {
        return Vec::new();
    }
    if k < indexed.len() {
        indexed.select_nth_unstable_by(k - 1, |a, b| b.1.total_cmp(&a.1));
        indexed.truncate(k);
    }
    indexed.sort_by(|a, b| b.1.total_cmp(&a.1));
    indexed
}
