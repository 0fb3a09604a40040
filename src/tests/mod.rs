//! # Test Suite for Matrix Station
//!
//! End-to-end checks that drive the public library API the way the binary
//! does: synthetic citypage documents in, rendered panel text out. Unit tests
//! for individual modules live next to their code.

mod pipeline_tests;
