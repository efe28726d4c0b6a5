//! Junction Simulation Library
//!
//! A real-time agent simulation of a signalized traffic intersection that
//! can run headless or feed an external renderer.

pub mod simulation;
