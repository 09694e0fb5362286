//! Checkout flow as an explicit state machine.
//!
//! The hosted checkout widget reports completion and dismissal through
//! separate callbacks, and a dismiss can arrive after a successful payment
//! while verification is still running. Modeling "verifying" as a state
//! (not a mutable flag consulted by a dismiss handler) makes that race
//! unrepresentable: `Dismissed` only resets the flow from `CheckoutOpen`.

use crate::gateway::GatewayOrder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutCallback {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutState {
    Idle,
    OrderCreated { order_id: String },
    CheckoutOpen { order_id: String },
    Verifying { callback: CheckoutCallback },
    Done { subscription_id: Option<String> },
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub enum CheckoutEvent {
    OrderCreated(GatewayOrder),
    Opened,
    /// Gateway reported a completed payment; verification starts.
    Completed(CheckoutCallback),
    /// User closed the widget without paying.
    Dismissed,
    VerificationSucceeded { subscription_id: Option<String> },
    VerificationFailed { reason: String },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid checkout transition: {state} on {event}")]
pub struct InvalidTransition {
    pub state: &'static str,
    pub event: &'static str,
}

impl CheckoutState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::OrderCreated { .. } => "order_created",
            Self::CheckoutOpen { .. } => "checkout_open",
            Self::Verifying { .. } => "verifying",
            Self::Done { .. } => "done",
            Self::Failed { .. } => "failed",
        }
    }

    /// Apply an event, returning the next state.
    ///
    /// A dismiss while verifying is swallowed on purpose: the payment has
    /// already happened and the outcome is decided by verification alone.
    pub fn apply(self, event: CheckoutEvent) -> Result<CheckoutState, InvalidTransition> {
        let event_name = event_name(&event);
        match (self, event) {
            (Self::Idle, CheckoutEvent::OrderCreated(order)) => {
                Ok(Self::OrderCreated { order_id: order.id })
            }
            (Self::OrderCreated { order_id }, CheckoutEvent::Opened) => {
                Ok(Self::CheckoutOpen { order_id })
            }
            (Self::CheckoutOpen { .. }, CheckoutEvent::Completed(callback)) => {
                Ok(Self::Verifying { callback })
            }
            (Self::CheckoutOpen { .. }, CheckoutEvent::Dismissed) => Ok(Self::Idle),
            (state @ Self::Verifying { .. }, CheckoutEvent::Dismissed) => Ok(state),
            (Self::Verifying { .. }, CheckoutEvent::VerificationSucceeded { subscription_id }) => {
                Ok(Self::Done { subscription_id })
            }
            (Self::Verifying { .. }, CheckoutEvent::VerificationFailed { reason }) => {
                Ok(Self::Failed { reason })
            }
            (state, _) => Err(InvalidTransition {
                state: state.name(),
                event: event_name,
            }),
        }
    }
}

fn event_name(event: &CheckoutEvent) -> &'static str {
    match event {
        CheckoutEvent::OrderCreated(_) => "order_created",
        CheckoutEvent::Opened => "opened",
        CheckoutEvent::Completed(_) => "completed",
        CheckoutEvent::Dismissed => "dismissed",
        CheckoutEvent::VerificationSucceeded { .. } => "verification_succeeded",
        CheckoutEvent::VerificationFailed { .. } => "verification_failed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> GatewayOrder {
        GatewayOrder {
            id: "order_abc".into(),
            amount: 170_000,
            currency: "INR".into(),
        }
    }

    fn callback() -> CheckoutCallback {
        CheckoutCallback {
            razorpay_order_id: "order_abc".into(),
            razorpay_payment_id: "pay_xyz".into(),
            razorpay_signature: "sig".into(),
        }
    }

    #[test]
    fn happy_path() {
        let state = CheckoutState::Idle
            .apply(CheckoutEvent::OrderCreated(order()))
            .unwrap()
            .apply(CheckoutEvent::Opened)
            .unwrap()
            .apply(CheckoutEvent::Completed(callback()))
            .unwrap()
            .apply(CheckoutEvent::VerificationSucceeded {
                subscription_id: Some("gy_sub_x".into()),
            })
            .unwrap();
        assert!(matches!(state, CheckoutState::Done { .. }));
    }

    #[test]
    fn dismiss_before_payment_resets() {
        let state = CheckoutState::Idle
            .apply(CheckoutEvent::OrderCreated(order()))
            .unwrap()
            .apply(CheckoutEvent::Opened)
            .unwrap()
            .apply(CheckoutEvent::Dismissed)
            .unwrap();
        assert_eq!(state, CheckoutState::Idle);
    }

    #[test]
    fn dismiss_while_verifying_is_ignored() {
        let verifying = CheckoutState::Verifying {
            callback: callback(),
        };
        let state = verifying.clone().apply(CheckoutEvent::Dismissed).unwrap();
        assert_eq!(state, verifying);

        // and the verification outcome still lands
        let state = state
            .apply(CheckoutEvent::VerificationFailed {
                reason: "signature mismatch".into(),
            })
            .unwrap();
        assert!(matches!(state, CheckoutState::Failed { .. }));
    }

    #[test]
    fn checkout_cannot_open_twice() {
        let state = CheckoutState::Idle
            .apply(CheckoutEvent::OrderCreated(order()))
            .unwrap()
            .apply(CheckoutEvent::Opened)
            .unwrap();
        assert!(state.apply(CheckoutEvent::Opened).is_err());
    }

    #[test]
    fn verification_requires_completed_checkout() {
        assert!(CheckoutState::Idle
            .apply(CheckoutEvent::VerificationSucceeded {
                subscription_id: None
            })
            .is_err());
    }
}
