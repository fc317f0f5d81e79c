//! Character-budget allocation across ordered documents.

use jungai_core::TruncationPolicy;

/// Decide how many characters each document keeps under `budget`.
///
/// `lengths` are document sizes in corpus order. The result has the same
/// length; every entry is at most its document's size and the entries sum to
/// `min(budget, lengths.sum())`. The allocation depends only on the inputs.
#[must_use]
pub fn allocate_budget(lengths: &[usize], budget: usize, policy: TruncationPolicy) -> Vec<usize> {
    match policy {
        TruncationPolicy::Priority => allocate_in_order(lengths, budget),
        TruncationPolicy::Balanced => allocate_fair_share(lengths, budget),
    }
}

fn allocate_in_order(lengths: &[usize], budget: usize) -> Vec<usize> {
    let mut remaining = budget;
    lengths
        .iter()
        .map(|&len| {
            let take = len.min(remaining);
            remaining -= take;
            take
        })
        .collect()
}

fn allocate_fair_share(lengths: &[usize], budget: usize) -> Vec<usize> {
    let mut alloc = vec![0usize; lengths.len()];
    let mut remaining = budget;
    let mut open: Vec<usize> = (0..lengths.len()).filter(|&i| lengths[i] > 0).collect();

    while remaining > 0 && !open.is_empty() {
        let share = remaining / open.len();
        if share == 0 {
            // Fewer characters than open documents: one each, earliest first.
            for &i in open.iter().take(remaining) {
                alloc[i] += 1;
            }
            break;
        }

        let mut still_open = Vec::with_capacity(open.len());
        for &i in &open {
            let give = (lengths[i] - alloc[i]).min(share);
            alloc[i] += give;
            remaining -= give;
            if alloc[i] < lengths[i] {
                still_open.push(i);
            }
        }
        open = still_open;
    }

    alloc
}
