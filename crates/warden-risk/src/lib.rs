//! # warden-risk
//!
//! Weighted multi-factor risk scoring for the Warden governance engine.
//!
//! ## Overview
//!
//! Three scorers live here:
//!
//! - [`RiskClassifier`] — five weighted factors over a single action
//!   (financial, reversibility, category, urgency, visibility). Implements
//!   [`warden_core::traits::RiskScorer`] so it plugs straight into the
//!   decision router.
//! - [`PipelineRiskClassifier`] — aggregate scoring over multi-step tool
//!   pipelines: per-tool risk, dangerous combinations, structural
//!   complexity with dependency-depth analysis, sensitive data flow, and
//!   the pipeline's own declaration.
//! - [`SixHatsEvaluator`] — a six-perspective qualitative consensus used
//!   as an advisory signal for borderline decisions.
//!
//! All three are pure: identical inputs under identical configuration
//! always produce identical outputs.

pub mod classifier;
pub mod pipeline;
pub mod six_hats;

pub use classifier::RiskClassifier;
pub use pipeline::PipelineRiskClassifier;
pub use six_hats::SixHatsEvaluator;
