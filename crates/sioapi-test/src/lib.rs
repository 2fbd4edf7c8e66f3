//! Test harnesses for the sioapi command line.

#[cfg(test)]
pub mod cli;
