// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Foundation types shared across the graft workspace.
//!
//! This crate holds the positional vocabulary the CST library is built on:
//!
//! - [`Span`] — half-open byte ranges into UTF-8 source.
//! - [`LineIndex`] — newline table for offset ↔ line/column conversions.
//! - [`TriviaEntry`] — one free-floating comment or blank-line marker in the
//!   side-table that accompanies a positioned syntax tree.
//!
//! Nothing here knows about the grammar; these are plain value types.

pub mod span;
pub mod text;
pub mod trivia;

pub use span::Span;
pub use text::LineIndex;
pub use trivia::{Placement, TriviaEntry, TriviaKind};
