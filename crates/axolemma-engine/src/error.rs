// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for the simulation engine

use axolemma_membrane::ParameterError;

/// Everything the engine can reject.
///
/// Rejections never leave the engine half-updated: state is either fully
/// changed or untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(#[from] ParameterError),

    #[error("invalid stimulus: {0}")]
    InvalidStimulus(String),

    #[error("run duration must be finite and > 0, got {0}")]
    InvalidRunDuration(f64),

    #[error("invalid engine settings: {0}")]
    InvalidSettings(String),

    #[error("parameter update payload rejected: {0}")]
    MalformedUpdate(String),

    #[error("reentrant engine call rejected: {0}")]
    ReentrantCall(&'static str),

    #[error("realtime runner already running")]
    RunnerAlreadyRunning,

    #[error("failed to spawn tick thread: {0}")]
    ThreadSpawn(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
