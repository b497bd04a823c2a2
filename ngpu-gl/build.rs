// Generates the raw GL/GLES function-pointer bindings consumed by `gl::*`
// in this crate. The teacher (`backend_gl`) generates an equivalent module
// the same way (`gl_generator` is a build-dependency there too); its
// generated output wasn't part of the retrieval pack, so this build script
// is authored fresh against the `gl_generator` API, which the teacher's own
// `Cargo.toml` already commits this crate to.

use gl_generator::{Api, Fallbacks, Profile, Registry, StructGenerator};
use std::env;
use std::fs::File;
use std::path::Path;

fn main() {
    let out_dir = env::var("OUT_DIR").unwrap();
    let mut file = File::create(Path::new(&out_dir).join("gl_bindings.rs")).unwrap();

    let registry = Registry::new(
        Api::Gl,
        (4, 5),
        Profile::Core,
        Fallbacks::All,
        [
            "GL_KHR_debug",
            "GL_ARB_shading_language_420pack",
            "GL_ARB_compute_shader",
        ],
    );

    registry
        .write_bindings(StructGenerator, &mut file)
        .unwrap();
}
