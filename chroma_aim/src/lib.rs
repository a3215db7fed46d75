// THEORY:
// This file is the entry point for the `chroma_aim` library crate. It exposes
// the tracking loop (`pipeline`), the control surface it reads from
// (`control`), and the device traits it drives (`devices`).
//
// The analytical stages live in `core_modules` and are pure functions over
// frames and masks: color mask, blob location, aim vector. Everything that
// touches the real display or input devices sits behind the traits in
// `devices`, with Linux implementations in `platform`.

pub mod config;
pub mod control;
pub mod core_modules;
pub mod devices;
pub mod error;
pub mod pipeline;
pub mod platform;
