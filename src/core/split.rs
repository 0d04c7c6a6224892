//! Split allocation: partitioning an expense total across participants.
//!
//! All arithmetic happens in integer cents so shares always sum back to the
//! declared total exactly; any rounding residue is distributed one cent at a
//! time to the earliest participants in input order.

use crate::constants::PERCENT_TOLERANCE;
use crate::core::errors::DivvyError;
use crate::core::models::{Split, SplitType};

/// A participant whose identity has already been resolved to a user id.
/// Name-to-id resolution (with its fallback policy) happens in the service
/// layer; the allocator itself is pure.
#[derive(Clone, Debug)]
pub struct Participant {
    pub user_id: String,
    pub user_name: Option<String>,
    pub amount_cents: Option<i64>,
    pub percentage: Option<f64>,
}

pub fn allocate(
    amount_cents: i64,
    split_type: SplitType,
    participants: &[Participant],
) -> Result<Vec<Split>, DivvyError> {
    if participants.is_empty() {
        return Err(DivvyError::invalid_input(
            "splits",
            "At least one participant is required",
        ));
    }

    let shares = match split_type {
        SplitType::Equal => equal_shares(amount_cents, participants.len()),
        SplitType::Custom => custom_shares(amount_cents, participants)?,
        SplitType::Percentage => percentage_shares(amount_cents, participants)?,
    };

    Ok(participants
        .iter()
        .zip(shares)
        .map(|(p, amount_cents)| Split {
            user_id: p.user_id.clone(),
            user_name: p.user_name.clone(),
            amount_cents,
            percentage: match split_type {
                SplitType::Percentage => p.percentage,
                _ => None,
            },
            paid: false,
        })
        .collect())
}

fn equal_shares(amount_cents: i64, count: usize) -> Vec<i64> {
    let n = count as i64;
    let base = amount_cents / n;
    let remainder = amount_cents % n;
    (0..n).map(|i| if i < remainder { base + 1 } else { base }).collect()
}

fn custom_shares(amount_cents: i64, participants: &[Participant]) -> Result<Vec<i64>, DivvyError> {
    let mut shares = Vec::with_capacity(participants.len());
    for p in participants {
        let share = p
            .amount_cents
            .ok_or_else(|| DivvyError::invalid_input("splits", "Custom splits require an amount per participant"))?;
        if share < 0 {
            return Err(DivvyError::invalid_input("splits", "Split amounts cannot be negative"));
        }
        shares.push(share);
    }
    let total: i64 = shares.iter().sum();
    if total != amount_cents {
        return Err(DivvyError::AllocationMismatch(format!(
            "split amounts sum to {} cents, expected {}",
            total, amount_cents
        )));
    }
    Ok(shares)
}

fn percentage_shares(amount_cents: i64, participants: &[Participant]) -> Result<Vec<i64>, DivvyError> {
    let mut percentages = Vec::with_capacity(participants.len());
    for p in participants {
        let pct = p
            .percentage
            .ok_or_else(|| DivvyError::invalid_input("splits", "Percentage splits require a percentage per participant"))?;
        if !pct.is_finite() || pct < 0.0 {
            return Err(DivvyError::invalid_input("splits", "Percentages must be non-negative numbers"));
        }
        percentages.push(pct);
    }
    let pct_sum: f64 = percentages.iter().sum();
    if (pct_sum - 100.0).abs() > PERCENT_TOLERANCE {
        return Err(DivvyError::AllocationMismatch(format!(
            "percentages sum to {}, expected 100",
            pct_sum
        )));
    }

    let mut shares: Vec<i64> = percentages
        .iter()
        .map(|pct| (amount_cents as f64 * pct / 100.0).floor() as i64)
        .collect();

    // Flooring leaves residue cents (and the tolerance can leave the floored
    // sum a cent over); walk the participants in input order until the shares
    // reconcile with the total exactly.
    let mut remainder = amount_cents - shares.iter().sum::<i64>();
    let mut i = 0;
    while remainder != 0 {
        if remainder > 0 {
            shares[i] += 1;
            remainder -= 1;
        } else if shares[i] > 0 {
            shares[i] -= 1;
            remainder += 1;
        }
        i = (i + 1) % shares.len();
    }
    Ok(shares)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(id: &str) -> Participant {
        Participant {
            user_id: id.to_string(),
            user_name: None,
            amount_cents: None,
            percentage: None,
        }
    }

    fn with_amount(id: &str, cents: i64) -> Participant {
        Participant {
            amount_cents: Some(cents),
            ..participant(id)
        }
    }

    fn with_percentage(id: &str, pct: f64) -> Participant {
        Participant {
            percentage: Some(pct),
            ..participant(id)
        }
    }

    #[test]
    fn equal_split_gives_remainder_to_earliest() {
        let parts = [participant("a"), participant("b"), participant("c")];
        let splits = allocate(10_000, SplitType::Equal, &parts).unwrap();
        let shares: Vec<i64> = splits.iter().map(|s| s.amount_cents).collect();
        assert_eq!(shares, vec![3334, 3333, 3333]);
    }

    #[test]
    fn equal_split_sums_exactly_with_bounded_spread() {
        for amount in [0, 1, 99, 100, 101, 12_345, 99_999] {
            for n in 1..=7 {
                let parts: Vec<Participant> = (0..n).map(|i| participant(&format!("u{}", i))).collect();
                let splits = allocate(amount, SplitType::Equal, &parts).unwrap();
                let shares: Vec<i64> = splits.iter().map(|s| s.amount_cents).collect();
                assert_eq!(shares.iter().sum::<i64>(), amount);
                let max = shares.iter().max().unwrap();
                let min = shares.iter().min().unwrap();
                assert!(max - min <= 1, "spread > 1 cent for {} over {}", amount, n);
            }
        }
    }

    #[test]
    fn equal_split_requires_participants() {
        assert!(allocate(100, SplitType::Equal, &[]).is_err());
    }

    #[test]
    fn custom_split_accepts_matching_amounts() {
        let parts = [with_amount("a", 2500), with_amount("b", 7500)];
        let splits = allocate(10_000, SplitType::Custom, &parts).unwrap();
        assert_eq!(splits[0].amount_cents, 2500);
        assert_eq!(splits[1].amount_cents, 7500);
        assert!(splits.iter().all(|s| !s.paid));
    }

    #[test]
    fn custom_split_rejects_mismatched_total() {
        let parts = [with_amount("a", 2500), with_amount("b", 7000)];
        let result = allocate(10_000, SplitType::Custom, &parts);
        assert!(matches!(result, Err(DivvyError::AllocationMismatch(_))));
    }

    #[test]
    fn custom_split_rejects_negative_share() {
        let parts = [with_amount("a", -100), with_amount("b", 10_100)];
        assert!(allocate(10_000, SplitType::Custom, &parts).is_err());
    }

    #[test]
    fn percentage_split_distributes_rounding_residue() {
        let parts = [
            with_percentage("a", 33.33),
            with_percentage("b", 33.33),
            with_percentage("c", 33.34),
        ];
        let splits = allocate(1000, SplitType::Percentage, &parts).unwrap();
        let shares: Vec<i64> = splits.iter().map(|s| s.amount_cents).collect();
        assert_eq!(shares.iter().sum::<i64>(), 1000);
        assert_eq!(shares, vec![334, 333, 333]);
        assert_eq!(splits[0].percentage, Some(33.33));
    }

    #[test]
    fn percentage_split_sums_exactly_for_even_percentages() {
        let parts = [with_percentage("a", 50.0), with_percentage("b", 50.0)];
        let splits = allocate(9999, SplitType::Percentage, &parts).unwrap();
        let shares: Vec<i64> = splits.iter().map(|s| s.amount_cents).collect();
        assert_eq!(shares.iter().sum::<i64>(), 9999);
    }

    #[test]
    fn percentage_split_rejects_non_100_sum() {
        let parts = [with_percentage("a", 60.0), with_percentage("b", 30.0)];
        let result = allocate(10_000, SplitType::Percentage, &parts);
        assert!(matches!(result, Err(DivvyError::AllocationMismatch(_))));
    }

    #[test]
    fn percentage_split_requires_percentages() {
        let parts = [with_percentage("a", 100.0), participant("b")];
        assert!(allocate(10_000, SplitType::Percentage, &parts).is_err());
    }
}
