//! End-to-end outline scenarios.

mod scenarios;
