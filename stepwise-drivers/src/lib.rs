//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in stepwise-core:
//!
//! - Motor drivers (two-channel PWM H-bridge)
//! - Encoders (quadrature decoding onto a shared counter)
//! - Controllers (fixed-point proportional)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod controller;
pub mod encoder;
pub mod motor;
