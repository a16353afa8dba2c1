//! Order status state machine.
//!
//! Validates status transitions: a terminal order never changes again,
//! and a non-terminal order may only move to a strictly higher-ranked
//! status. The terminal check runs first and independently of the rank
//! check — `Canceled` ranks below `Completed`, so rank comparison alone
//! would wrongly permit `Canceled -> Completed`.

use thiserror::Error;
use tracker_types::OrderStatus;

/// Errors returned when a requested transition violates the rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
	/// The order is in a terminal status and can no longer change.
	#[error("order is {current} and can no longer change status")]
	Terminal { current: OrderStatus },
	/// The requested status does not rank above the current one.
	#[error("status may not move backward or stay the same ({current} -> {requested})")]
	Regression {
		current: OrderStatus,
		requested: OrderStatus,
	},
}

/// Decides whether an order may move from `current` to `requested`.
///
/// Pure decision function; the caller persists the result and publishes
/// the corresponding event.
pub fn transition(
	current: OrderStatus,
	requested: OrderStatus,
) -> Result<OrderStatus, TransitionError> {
	if current.is_terminal() {
		return Err(TransitionError::Terminal { current });
	}

	if requested.rank() <= current.rank() {
		return Err(TransitionError::Regression { current, requested });
	}

	Ok(requested)
}

#[cfg(test)]
mod tests {
	use super::*;
	use tracker_types::OrderStatus::*;

	#[test]
	fn forward_transitions_succeed() {
		assert_eq!(transition(Pending, Processed), Ok(Processed));
		assert_eq!(transition(Processed, Shipped), Ok(Shipped));
		assert_eq!(transition(Pending, Canceled), Ok(Canceled));
		assert_eq!(transition(Delivered, Completed), Ok(Completed));
	}

	#[test]
	fn terminal_statuses_reject_every_request() {
		for current in [Canceled, Completed] {
			for requested in OrderStatus::all() {
				assert_eq!(
					transition(current, requested),
					Err(TransitionError::Terminal { current }),
					"{current} -> {requested}"
				);
			}
		}
	}

	#[test]
	fn rank_regressions_are_rejected() {
		for current in OrderStatus::all().filter(|s| !s.is_terminal()) {
			for requested in OrderStatus::all().filter(|r| r.rank() <= current.rank()) {
				assert_eq!(
					transition(current, requested),
					Err(TransitionError::Regression { current, requested }),
					"{current} -> {requested}"
				);
			}
		}
	}

	#[test]
	fn every_higher_rank_is_reachable_from_non_terminal() {
		for current in OrderStatus::all().filter(|s| !s.is_terminal()) {
			for requested in OrderStatus::all().filter(|r| r.rank() > current.rank()) {
				assert_eq!(transition(current, requested), Ok(requested));
			}
		}
	}

	#[test]
	fn canceled_to_completed_is_terminal_not_a_rank_step() {
		// Completed ranks above Canceled; only the terminal check blocks it.
		assert_eq!(
			transition(Canceled, Completed),
			Err(TransitionError::Terminal { current: Canceled })
		);
	}
}
