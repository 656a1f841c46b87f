//! Integration tests for the iragent CLI
//!
//! These tests spawn the actual binary. Host probing is avoided by planning
//! against facts snapshots, so nothing here touches the machine running them.
