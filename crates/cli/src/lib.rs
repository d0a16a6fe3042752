//! Shared helpers for the command-line tools.

pub mod bidding_utils;
