//! Raw GL function pointers, generated by `build.rs` via `gl_generator`
//! (the teacher's own `api` module, generated the same way, was not present
//! in the retrieval pack — see DESIGN.md).

#![allow(non_upper_case_globals, non_snake_case, dead_code, clippy::all)]

include!(concat!(env!("OUT_DIR"), "/gl_bindings.rs"));
