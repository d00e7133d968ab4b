//! Shared helpers for classifying Azure service failures.

pub mod network;
