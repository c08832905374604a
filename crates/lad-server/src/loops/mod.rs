//! Background loops.

pub mod session_expiry_loop;
