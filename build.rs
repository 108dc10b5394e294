use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::Path;
#[cfg(feature = "rebuild-wasm")]
use std::process::Command;

fn hash_file(path: &Path) -> String {
    let content = fs::read(path).unwrap_or_default();
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("{:016x}", hasher.finish())[..8].to_string()
}

/// Build the retro-fx package into static/pkg with wasm-pack.
#[cfg(feature = "rebuild-wasm")]
fn build_wasm() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let pkg_entry = Path::new(&manifest_dir).join("static/pkg/retro_fx.js");
    // The outer build holds the lock on the workspace target dir
    let target_dir = Path::new(&std::env::var("OUT_DIR").unwrap()).join("wasm-target");

    let status = Command::new("wasm-pack")
        .current_dir(&manifest_dir)
        .env("CARGO_TARGET_DIR", &target_dir)
        .args([
            "build",
            "crates/retro-fx",
            "--target",
            "web",
            "--release",
            "--out-dir",
            "../../static/pkg",
        ])
        .status();

    match status {
        Ok(s) if s.success() => {}
        Ok(s) => {
            eprintln!("wasm-pack exited with status: {}", s);
            std::process::exit(1);
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if pkg_entry.exists() {
                eprintln!("Warning: 'wasm-pack' not found, using existing static/pkg");
                return;
            }
            eprintln!("Error: 'wasm-pack' not found in PATH");
            eprintln!();
            eprintln!("Install it with: cargo install wasm-pack");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Failed to run wasm-pack: {}", e);
            std::process::exit(1);
        }
    }
}

fn main() {
    // Re-run build script if relevant files change
    println!("cargo:rerun-if-changed=static/css/site.css");
    println!("cargo:rerun-if-changed=static/js/admin.js");
    println!("cargo:rerun-if-changed=static/js/site.js");
    println!("cargo:rerun-if-changed=static/js/fx.js");
    println!("cargo:rerun-if-changed=templates/");

    #[cfg(feature = "rebuild-wasm")]
    {
        println!("cargo:rerun-if-changed=crates/retro-fx/src");
        build_wasm();
    }

    // Hash static assets for cache busting
    let css_hash = hash_file(Path::new("static/css/site.css"));
    let js_hash = hash_file(Path::new("static/js/admin.js"));
    let site_js_hash = hash_file(Path::new("static/js/site.js"));

    // Write generated code to OUT_DIR
    let out_dir = std::env::var("OUT_DIR").unwrap();
    fs::write(
        Path::new(&out_dir).join("asset_hashes.rs"),
        format!(
            r#"/// Hash of site.css for cache busting
pub const SITE_CSS_HASH: &str = "{}";
/// Hash of admin.js for cache busting
pub const ADMIN_JS_HASH: &str = "{}";
/// Hash of site.js for cache busting
pub const SITE_JS_HASH: &str = "{}";"#,
            css_hash, js_hash, site_js_hash
        ),
    )
    .unwrap();
}
