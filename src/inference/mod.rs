// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Export all submodules and their public types
pub mod generation;
pub mod session;

// Re-export main types for convenience
pub use generation::{generate, DecodingParams};
pub use session::{load_session, ExecutionTarget, DEFAULT_INTRA_THREADS};

/// Caption decoding: beam search, 3 beams, at most 40 tokens including the start token
pub const CAPTION_DECODING: DecodingParams = DecodingParams::beam(40, 3);

/// Translation decoding: greedy, at most 80 tokens
pub const TRANSLATION_DECODING: DecodingParams = DecodingParams::greedy(80);
