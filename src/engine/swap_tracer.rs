//! Swap leg reconstruction from an owner batch call.
//!
//! The venue is unknown, so legs are inferred from the transaction's ordered
//! log stream and the batch's native sub-calls. The pending input/output is an
//! explicit state machine; every transition lives in [`Tracer::transition`].
//!
//! The native-currency sentinel is the zero address. Unmatched pending legs
//! are dropped and counted, never fabricated.

use crate::domain::{Address, Amount, FlashQuote, RawLog, SubCall, TracedLog};
use tracing::debug;

/// What the tracer knows about the account being traced.
#[derive(Debug, Clone)]
pub struct TraceContext {
    /// Account whose owner made the batch call.
    pub account: Address,
    /// Addresses that receive swap output, after swapper indirection.
    pub beneficiaries: Vec<Address>,
    /// Beneficiaries assigned to native unwraps by third parties, in turn.
    pub round_robin: Vec<Address>,
    /// Beneficiary for proceeds routed back to the account before forwarding.
    pub default_beneficiary: Option<Address>,
}

impl TraceContext {
    /// Context for a single-beneficiary account such as a swapper.
    pub fn single(account: Address, beneficiary: Address) -> Self {
        Self {
            account,
            beneficiaries: vec![beneficiary.clone()],
            round_robin: vec![beneficiary.clone()],
            default_beneficiary: Some(beneficiary),
        }
    }

    fn beneficiary(&self, addr: &Address) -> Option<&Address> {
        self.beneficiaries.iter().find(|b| *b == addr)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapLeg {
    pub input_token: Address,
    pub input_amount: Amount,
    pub output_token: Address,
    pub output_amount: Amount,
    pub beneficiary: Address,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceReport {
    pub legs: Vec<SwapLeg>,
    /// Pending legs that never found a match.
    pub dropped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PendingState {
    #[default]
    NoPending,
    /// Debited from the account, waiting for an output. `matched` is set once
    /// routed-back proceeds have been paired with it.
    InputPending {
        token: Address,
        amount: Amount,
        matched: bool,
    },
    /// Credited to a beneficiary, waiting for an input.
    OutputPending {
        token: Address,
        amount: Amount,
        beneficiary: Address,
    },
}

/// A log classified relative to the traced account.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Observation {
    /// Account sent tokens straight to a beneficiary.
    PaidBeneficiary {
        token: Address,
        amount: Amount,
        beneficiary: Address,
    },
    /// Account sent tokens to a venue.
    SentToVenue { token: Address, amount: Amount },
    /// Account received tokens.
    Received { token: Address, amount: Amount },
    /// A third party paid a beneficiary.
    VenuePaidBeneficiary {
        token: Address,
        amount: Amount,
        beneficiary: Address,
    },
    /// A third party wrapped native currency.
    VenueWrapped { amount: Amount },
    /// A third party unwrapped to native currency.
    VenueUnwrapped { amount: Amount },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DirectTransfer {
    beneficiary: Address,
    amount: Amount,
}

#[derive(Debug, Default)]
struct Tracer {
    state: PendingState,
    /// Native wrapped by the account itself: `(wrapped token, amount)`.
    wrapped: Option<(Address, Amount)>,
    round_robin_index: usize,
    direct: Vec<DirectTransfer>,
    report: TraceReport,
}

/// Reconstruct swap legs for one batch call.
pub fn trace(ctx: &TraceContext, calls: &[SubCall], logs: &[RawLog]) -> TraceReport {
    let mut tracer = Tracer::default();

    for call in calls {
        if call.value.is_zero() {
            continue;
        }
        if let Some(beneficiary) = ctx.beneficiary(&call.to) {
            tracer.direct.push(DirectTransfer {
                beneficiary: beneficiary.clone(),
                amount: call.value,
            });
        }
    }

    for log in logs {
        match log.decode() {
            TracedLog::Transfer {
                token,
                from,
                to,
                amount,
            } => {
                let observation = if from == ctx.account {
                    match ctx.beneficiary(&to) {
                        Some(beneficiary) => Observation::PaidBeneficiary {
                            token,
                            amount,
                            beneficiary: beneficiary.clone(),
                        },
                        None => Observation::SentToVenue { token, amount },
                    }
                } else if to == ctx.account {
                    Observation::Received { token, amount }
                } else if let Some(beneficiary) = ctx.beneficiary(&to) {
                    Observation::VenuePaidBeneficiary {
                        token,
                        amount,
                        beneficiary: beneficiary.clone(),
                    }
                } else {
                    continue;
                };
                tracer.transition(ctx, observation);
            }
            TracedLog::Wrap {
                token,
                depositor,
                amount,
            } => {
                if depositor == ctx.account {
                    tracer.wrapped = Some((token, amount));
                } else {
                    tracer.transition(ctx, Observation::VenueWrapped { amount });
                }
            }
            TracedLog::Unwrap {
                token,
                withdrawer,
                amount,
            } => {
                if withdrawer == ctx.account {
                    tracer.reclassify_direct(token, amount);
                } else {
                    tracer.transition(ctx, Observation::VenueUnwrapped { amount });
                }
            }
            TracedLog::Unrecognized => {}
        }
    }

    tracer.finish()
}

/// Legs for a swapper flash: one per quote plus the excess, all paid to the
/// swapper's beneficiary in `token_to_beneficiary`.
pub fn flash_legs(
    beneficiary: &Address,
    token_to_beneficiary: &Address,
    quotes: &[FlashQuote],
    excess: Amount,
) -> Vec<SwapLeg> {
    let mut legs: Vec<SwapLeg> = quotes
        .iter()
        .map(|quote| SwapLeg {
            input_token: quote.base_token.clone(),
            input_amount: quote.base_amount,
            output_token: token_to_beneficiary.clone(),
            output_amount: quote.amount_to_beneficiary,
            beneficiary: beneficiary.clone(),
        })
        .collect();
    if !excess.is_zero() {
        legs.push(SwapLeg {
            input_token: token_to_beneficiary.clone(),
            input_amount: excess,
            output_token: token_to_beneficiary.clone(),
            output_amount: excess,
            beneficiary: beneficiary.clone(),
        });
    }
    legs
}

impl Tracer {
    fn transition(&mut self, ctx: &TraceContext, observation: Observation) {
        use Observation::*;
        use PendingState::*;

        let state = std::mem::take(&mut self.state);
        self.state = match (state, observation) {
            // Direct payment: native input if the account wrapped exactly this
            // amount first, else the pending input, else wait for one.
            (
                previous,
                PaidBeneficiary {
                    token,
                    amount,
                    beneficiary,
                },
            ) => {
                if self.take_wrapped(&token, amount) {
                    self.drop_pending(&previous);
                    self.emit(Address::zero(), amount, token, amount, beneficiary);
                    NoPending
                } else if let InputPending {
                    token: in_token,
                    amount: in_amount,
                    ..
                } = previous
                {
                    self.emit(in_token, in_amount, token, amount, beneficiary);
                    NoPending
                } else {
                    self.drop_pending(&previous);
                    OutputPending {
                        token,
                        amount,
                        beneficiary,
                    }
                }
            }

            (
                OutputPending {
                    token: out_token,
                    amount: out_amount,
                    beneficiary,
                },
                SentToVenue { token, amount },
            ) => {
                self.emit(token, amount, out_token, out_amount, beneficiary);
                NoPending
            }
            (previous, SentToVenue { token, amount }) => {
                self.drop_pending(&previous);
                let token = match self.take_wrapped(&token, amount) {
                    true => Address::zero(),
                    false => token,
                };
                InputPending {
                    token,
                    amount,
                    matched: false,
                }
            }

            // Proceeds routed back through the account before forwarding.
            (
                InputPending {
                    token: in_token,
                    amount: in_amount,
                    matched,
                },
                Received { token, amount },
            ) => {
                let matched = match &ctx.default_beneficiary {
                    Some(beneficiary) => {
                        self.emit(in_token.clone(), in_amount, token, amount, beneficiary.clone());
                        true
                    }
                    None => {
                        self.report.dropped += 1;
                        matched
                    }
                };
                InputPending {
                    token: in_token,
                    amount: in_amount,
                    matched,
                }
            }
            (previous, Received { .. }) => {
                self.report.dropped += 1;
                previous
            }

            (
                InputPending {
                    token: in_token,
                    amount: in_amount,
                    ..
                },
                VenuePaidBeneficiary {
                    token,
                    amount,
                    beneficiary,
                },
            ) => {
                self.emit(in_token, in_amount, token, amount, beneficiary);
                NoPending
            }
            (
                previous,
                VenuePaidBeneficiary {
                    token,
                    amount,
                    beneficiary,
                },
            ) => {
                self.drop_pending(&previous);
                OutputPending {
                    token,
                    amount,
                    beneficiary,
                }
            }

            (
                OutputPending {
                    token,
                    amount: out_amount,
                    beneficiary,
                },
                VenueWrapped { amount },
            ) => {
                self.emit(Address::zero(), amount, token, out_amount, beneficiary);
                NoPending
            }
            (previous, VenueWrapped { .. }) => previous,

            // Venues do not say which beneficiary an unwrap is for; assign in turn.
            (
                InputPending {
                    token,
                    amount: in_amount,
                    ..
                },
                VenueUnwrapped { amount },
            )
                if !ctx.round_robin.is_empty() =>
            {
                let index = self.round_robin_index % ctx.round_robin.len();
                let beneficiary = ctx.round_robin[index].clone();
                self.round_robin_index = (index + 1) % ctx.round_robin.len();
                self.emit(token, in_amount, Address::zero(), amount, beneficiary);
                NoPending
            }
            (previous, VenueUnwrapped { .. }) => {
                self.report.dropped += 1;
                previous
            }
        };
    }

    /// An unwrap by the account turns a native direct transfer of the same
    /// amount into a wrapped-to-native leg.
    fn reclassify_direct(&mut self, token: Address, amount: Amount) {
        match self.direct.iter().rposition(|d| d.amount == amount) {
            Some(pos) => {
                let direct = self.direct.remove(pos);
                self.emit(token, amount, Address::zero(), amount, direct.beneficiary);
            }
            None => self.report.dropped += 1,
        }
    }

    fn take_wrapped(&mut self, token: &Address, amount: Amount) -> bool {
        match &self.wrapped {
            Some((wrapped_token, wrapped_amount))
                if wrapped_token == token && *wrapped_amount == amount =>
            {
                self.wrapped = None;
                true
            }
            _ => false,
        }
    }

    fn drop_pending(&mut self, state: &PendingState) {
        let unmatched = match state {
            PendingState::NoPending => false,
            PendingState::InputPending { matched, .. } => !matched,
            PendingState::OutputPending { .. } => true,
        };
        if unmatched {
            debug!("Dropping unmatched swap leg: {:?}", state);
            self.report.dropped += 1;
        }
    }

    fn emit(
        &mut self,
        input_token: Address,
        input_amount: Amount,
        output_token: Address,
        output_amount: Amount,
        beneficiary: Address,
    ) {
        self.report.legs.push(SwapLeg {
            input_token,
            input_amount,
            output_token,
            output_amount,
            beneficiary,
        });
    }

    fn finish(mut self) -> TraceReport {
        for direct in std::mem::take(&mut self.direct) {
            self.emit(
                Address::zero(),
                direct.amount,
                Address::zero(),
                direct.amount,
                direct.beneficiary,
            );
        }
        let state = std::mem::take(&mut self.state);
        self.drop_pending(&state);
        self.report
    }
}
