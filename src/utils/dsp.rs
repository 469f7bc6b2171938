//! Common, shared DSP tools for grain engines and effects.

pub mod delay;
