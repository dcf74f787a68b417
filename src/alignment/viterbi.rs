/// CTC Viterbi forced alignment over frame log-probabilities.
///
/// Returns one `(state, frame)` pair per frame, where `state` indexes into
/// `tokens`. Each frame either stays in its state, advances by one, or skips
/// a blank between two different labels. The path must end on the last label
/// or the trailing blank. Returns an empty path when no alignment fits.
pub fn forced_align_viterbi(log_probs: &[Vec<f32>], tokens: &[usize]) -> Vec<(usize, usize)> {
    let t_len = log_probs.len();
    let s_len = tokens.len();
    if t_len == 0 || s_len == 0 {
        return Vec::new();
    }

    let mut prev = vec![f32::NEG_INFINITY; s_len];
    let mut curr = vec![f32::NEG_INFINITY; s_len];
    let mut backpointers = vec![Step::Stay; t_len * s_len];

    prev[0] = emission(&log_probs[0], tokens[0]);
    if s_len > 1 {
        prev[1] = emission(&log_probs[0], tokens[1]);
    }

    for (t, row) in log_probs.iter().enumerate().skip(1) {
        let reachable = (2 * t + 1).min(s_len - 1);
        curr.iter_mut().for_each(|v| *v = f32::NEG_INFINITY);
        for s in 0..=reachable {
            let (best, step) = best_predecessor(&prev, s, tokens);
            if best == f32::NEG_INFINITY {
                continue;
            }
            curr[s] = best + emission(row, tokens[s]);
            backpointers[t * s_len + s] = step;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let mut s = s_len - 1;
    if s_len >= 2 && prev[s_len - 2] > prev[s_len - 1] {
        s = s_len - 2;
    }
    if prev[s] == f32::NEG_INFINITY {
        return Vec::new();
    }

    let mut path = Vec::with_capacity(t_len);
    path.push((s, t_len - 1));
    for t in (1..t_len).rev() {
        s = match backpointers[t * s_len + s] {
            Step::Stay => s,
            Step::Advance => s - 1,
            Step::SkipBlank => s - 2,
        };
        path.push((s, t - 1));
    }
    path.reverse();
    path
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Stay,
    Advance,
    SkipBlank,
}

fn emission(row: &[f32], token: usize) -> f32 {
    row.get(token).copied().unwrap_or(f32::NEG_INFINITY)
}

#[inline]
fn best_predecessor(prev: &[f32], s: usize, tokens: &[usize]) -> (f32, Step) {
    let mut best = prev[s];
    let mut step = Step::Stay;
    if s >= 1 && prev[s - 1] > best {
        best = prev[s - 1];
        step = Step::Advance;
    }
    if s >= 2 && tokens[s] != tokens[s - 2] && prev[s - 2] > best {
        best = prev[s - 2];
        step = Step::SkipBlank;
    }
    (best, step)
}
