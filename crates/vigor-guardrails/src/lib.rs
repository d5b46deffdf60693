//! # Vigor Guardrails
//!
//! Pure policy-evaluation layer wrapped around every agent invocation:
//! ordered rule evaluation at the input and output boundaries, payload
//! sanitization that rewrites rather than drops, disclaimer injection, and
//! a keyed token-bucket rate gate.
//!
//! The crate ships the *mechanism*; the concrete keyword lists live in
//! [`policy`] as plain data and can be replaced wholesale.

pub mod policy;
pub mod rate_limit;
pub mod rule;
pub mod sanitize;
pub mod validator;

pub use policy::{EDUCATIONAL_DISCLAIMER, GuardrailPolicy};
pub use rate_limit::{RateConfig, RateGate};
pub use rule::{GuardrailRule, MatchError, Matcher, RuleAction, RuleScope, Stage};
pub use validator::{BlockReason, GuardrailValidator, InputDecision, OutputDecision, OutputPolicy};
