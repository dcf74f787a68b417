//! Next-token selection for autoregressive speech models.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;

use crate::types::GenerationParams;

/// Applies the [`GenerationParams`] decoding knobs to one step of logits.
#[derive(Debug, Clone, Copy)]
pub struct TokenSampler {
    temperature: f32,
    cfg_weight: f32,
    min_p: f32,
    top_p: f32,
    repetition_penalty: f32,
}

impl TokenSampler {
    pub fn new(params: &GenerationParams) -> Self {
        Self {
            temperature: params.temperature,
            cfg_weight: params.cfg_weight,
            min_p: params.min_p,
            top_p: params.top_p,
            repetition_penalty: params.repetition_penalty,
        }
    }

    /// Picks the next token id.
    ///
    /// `uncond` holds the unconditional logits when the model runs a
    /// classifier-free guidance pass; `history` is every token emitted so far.
    pub fn sample(
        &self,
        cond: &[f32],
        uncond: Option<&[f32]>,
        history: &[usize],
        rng: &mut StdRng,
    ) -> usize {
        let mut logits = match uncond {
            Some(uncond) => apply_cfg(cond, uncond, self.cfg_weight),
            None => cond.to_vec(),
        };
        apply_repetition_penalty(&mut logits, history, self.repetition_penalty);

        if self.temperature <= 0.0 {
            return argmax(&logits);
        }
        for logit in &mut logits {
            *logit /= self.temperature;
        }

        let mut probs = softmax(&logits);
        apply_min_p(&mut probs, self.min_p);
        apply_top_p(&mut probs, self.top_p);

        match WeightedIndex::new(&probs) {
            Ok(dist) => dist.sample(rng),
            Err(_) => argmax(&logits),
        }
    }
}

fn apply_cfg(cond: &[f32], uncond: &[f32], cfg_weight: f32) -> Vec<f32> {
    cond.iter()
        .zip(uncond)
        .map(|(&c, &u)| c + cfg_weight * (c - u))
        .collect()
}

fn apply_repetition_penalty(logits: &mut [f32], history: &[usize], penalty: f32) {
    if penalty == 1.0 || penalty <= 0.0 {
        return;
    }
    let mut seen = vec![false; logits.len()];
    for &token in history {
        let Some(flag) = seen.get_mut(token) else {
            continue;
        };
        if *flag {
            continue;
        }
        *flag = true;
        let logit = &mut logits[token];
        if *logit > 0.0 {
            *logit /= penalty;
        } else {
            *logit *= penalty;
        }
    }
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max_logit = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !max_logit.is_finite() {
        return vec![0.0; logits.len()];
    }
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max_logit).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn apply_min_p(probs: &mut [f32], min_p: f32) {
    if min_p <= 0.0 {
        return;
    }
    let p_max = probs.iter().copied().fold(0.0f32, f32::max);
    let threshold = min_p * p_max;
    for p in probs.iter_mut() {
        if *p < threshold {
            *p = 0.0;
        }
    }
}

/// Keeps the smallest set of most likely tokens whose mass reaches `top_p`.
fn apply_top_p(probs: &mut [f32], top_p: f32) {
    if top_p >= 1.0 || top_p <= 0.0 {
        return;
    }
    let total: f32 = probs.iter().sum();
    if total <= 0.0 {
        return;
    }
    let mut order: Vec<usize> = (0..probs.len()).collect();
    order.sort_by(|&a, &b| probs[b].total_cmp(&probs[a]));

    let mut cumulative = 0.0;
    let mut keep = order.len();
    for (rank, &idx) in order.iter().enumerate() {
        cumulative += probs[idx] / total;
        if cumulative >= top_p {
            keep = rank + 1;
            break;
        }
    }
    for &idx in &order[keep..] {
        probs[idx] = 0.0;
    }
}

fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}
