// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Application services for PBS hosts: the config port and the engine
//! settings stored through it. Storage adapters stay thin and independent of
//! the engine.

pub mod config;
