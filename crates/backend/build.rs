use std::env;
use std::fs;
use std::path::Path;

// config.toml из корня workspace кладется рядом с бинарником gambio-sync,
// чтобы load_config() нашел его без дополнительных параметров.
fn main() {
    println!("cargo:rerun-if-changed=../../config.toml");

    // OUT_DIR: target/<profile>/build/gambio-sync-<hash>/out
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    let profile = env::var("PROFILE").expect("PROFILE is set by cargo");

    let Some(target_dir) = Path::new(&out_dir).ancestors().find(|p| p.ends_with(&profile)) else {
        println!("cargo:warning=target/{} not found, config.toml is not copied", profile);
        return;
    };

    let workspace_root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("backend crate lives in <workspace>/crates/backend");

    let source_config = workspace_root.join("config.toml");
    let dest_config = target_dir.join("config.toml");

    if !source_config.exists() {
        println!(
            "cargo:warning=config.toml not found at {:?}, embedded defaults will be used",
            source_config
        );
        return;
    }

    if let Err(e) = fs::copy(&source_config, &dest_config) {
        panic!("Failed to copy config.toml to {:?}: {}", dest_config, e);
    }
}
