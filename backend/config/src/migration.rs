//! Version translation chain.
//!
//! Applies translation steps in sequence to bring an older document up to the
//! current schema. Steps form an explicit table built at construction time;
//! the driver walks it one adjacent version pair at a time and stops at the
//! first failure without returning a partial tree.

use crate::path::ContextPath;
use crate::version::{Version, VersionedConfig, MAX_VERSION, V1, V2_0, V2_1, V2_2};
use crate::{v2_0, v2_1, v2_2};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranslateError {
    #[error("no translator registered from version {0}")]
    NoTranslator(Version),
    #[error("translator {from} -> {to} was given a version {found} document")]
    UnexpectedInput {
        from: Version,
        to: Version,
        found: Version,
    },
    #[error("translator {from} -> {to} produced a version {produced} document")]
    StepMismatch {
        from: Version,
        to: Version,
        produced: Version,
    },
    #[error("translator {from} -> {to} does not advance the version")]
    NotAdvancing { from: Version, to: Version },
    #[error("cannot represent {path} in the newer schema: {reason}")]
    Unrepresentable { path: ContextPath, reason: String },
}

pub type TranslateFn = fn(VersionedConfig) -> Result<VersionedConfig, TranslateError>;

/// One adjacent-version translator.
#[derive(Debug, Clone, Copy)]
pub struct Step {
    pub from: Version,
    pub to: Version,
    pub translate: TranslateFn,
}

/// Immutable table of translation steps, keyed by source version.
#[derive(Debug, Clone)]
pub struct TranslatorChain {
    steps: Vec<Step>,
    target: Version,
}

impl TranslatorChain {
    pub fn new(steps: Vec<Step>, target: Version) -> Self {
        Self { steps, target }
    }

    /// The chain for every supported version up to [`MAX_VERSION`].
    pub fn standard() -> Self {
        Self::new(
            vec![
                Step {
                    from: V1,
                    to: V2_0,
                    translate: step_v1_to_v2_0,
                },
                Step {
                    from: V2_0,
                    to: V2_1,
                    translate: step_v2_0_to_v2_1,
                },
                Step {
                    from: V2_1,
                    to: V2_2,
                    translate: step_v2_1_to_v2_2,
                },
            ],
            MAX_VERSION,
        )
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn target(&self) -> Version {
        self.target
    }

    fn step_from(&self, version: Version) -> Option<&Step> {
        self.steps.iter().find(|s| s.from == version)
    }

    /// Translate `config` step by step until it reaches the target version.
    pub fn translate(&self, config: VersionedConfig) -> Result<VersionedConfig, TranslateError> {
        let mut current = config;
        while current.version() < self.target {
            let version = current.version();
            let step = self
                .step_from(version)
                .ok_or(TranslateError::NoTranslator(version))?;
            if step.to <= step.from {
                return Err(TranslateError::NotAdvancing {
                    from: step.from,
                    to: step.to,
                });
            }

            current = (step.translate)(current)?;
            if current.version() != step.to {
                return Err(TranslateError::StepMismatch {
                    from: step.from,
                    to: step.to,
                    produced: current.version(),
                });
            }
            info!(from = %step.from, to = %step.to, "Translated config");
        }
        debug!(version = %current.version(), "Config at target version");
        Ok(current)
    }
}

impl Default for TranslatorChain {
    fn default() -> Self {
        Self::standard()
    }
}

/// Bring any supported document up to the current schema with the standard chain.
pub fn migrate(config: VersionedConfig) -> Result<v2_2::Config, TranslateError> {
    match TranslatorChain::standard().translate(config)? {
        VersionedConfig::V2_2(config) => Ok(config),
        other => Err(TranslateError::NoTranslator(other.version())),
    }
}

// ---------------------------------------------------------------------------
// Step adapters
// ---------------------------------------------------------------------------

fn unexpected(from: Version, to: Version, found: &VersionedConfig) -> TranslateError {
    TranslateError::UnexpectedInput {
        from,
        to,
        found: found.version(),
    }
}

fn step_v1_to_v2_0(config: VersionedConfig) -> Result<VersionedConfig, TranslateError> {
    match config {
        VersionedConfig::V1(old) => Ok(VersionedConfig::V2_0(v2_0::translate(&old))),
        other => Err(unexpected(V1, V2_0, &other)),
    }
}

fn step_v2_0_to_v2_1(config: VersionedConfig) -> Result<VersionedConfig, TranslateError> {
    match config {
        VersionedConfig::V2_0(old) => Ok(VersionedConfig::V2_1(v2_1::translate(&old))),
        other => Err(unexpected(V2_0, V2_1, &other)),
    }
}

fn step_v2_1_to_v2_2(config: VersionedConfig) -> Result<VersionedConfig, TranslateError> {
    match config {
        VersionedConfig::V2_1(old) => Ok(VersionedConfig::V2_2(v2_2::translate(&old)?)),
        other => Err(unexpected(V2_1, V2_2, &other)),
    }
}
