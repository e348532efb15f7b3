//! Unit tests for annotation format implementations.
//!
//! These tests exercise whole files: encode followed by decode, and
//! hand-written documents read back through the decoders.
