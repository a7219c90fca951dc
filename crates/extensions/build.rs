//! Discovers the built-in extension modules under `extensions/`.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

/// Writes `builtins.rs` into `OUT_DIR`: one `#[path]` module per file or
/// directory in `extensions/`, sorted by name, plus `BUILTIN_MODULES`.
fn main() -> io::Result<()> {
	let manifest_dir = env::var("CARGO_MANIFEST_DIR").map_err(io::Error::other)?;
	let out_dir = env::var("OUT_DIR").map_err(io::Error::other)?;
	let source_dir = Path::new(&manifest_dir).join("extensions");

	let mut modules = Vec::new();
	if source_dir.is_dir() {
		for entry in fs::read_dir(&source_dir)? {
			if let Some(module) = module_source(&entry?.path()) {
				modules.push(module);
			}
		}
	}
	modules.sort_by(|(a, _), (b, _)| a.cmp(b));

	let mut generated = String::new();
	for (name, path) in &modules {
		if !is_identifier(name) {
			return Err(io::Error::new(
				io::ErrorKind::InvalidInput,
				format!("extension module `{name}` is not a valid Rust identifier"),
			));
		}
		let _ = writeln!(generated, "#[path = {:?}]\npub mod {name};", path.display().to_string());
		println!("cargo:rerun-if-changed={}", path.display());
	}
	let names: Vec<&str> = modules.iter().map(|(name, _)| name.as_str()).collect();
	let _ = writeln!(
		generated,
		"\n/// Modules discovered under `extensions/`, sorted.\npub const BUILTIN_MODULES: &[&str] = &{names:?};"
	);

	fs::write(Path::new(&out_dir).join("builtins.rs"), generated)?;
	println!("cargo:rerun-if-changed=extensions");
	Ok(())
}

/// `name.rs` files and directories holding a `mod.rs`.
fn module_source(path: &Path) -> Option<(String, PathBuf)> {
	if path.is_dir() {
		let entry = path.join("mod.rs");
		let name = path.file_name()?.to_str()?;
		return entry.exists().then(|| (name.to_string(), entry));
	}
	if path.extension().is_some_and(|ext| ext == "rs") {
		let stem = path.file_stem()?.to_str()?;
		if stem != "mod" {
			return Some((stem.to_string(), path.to_path_buf()));
		}
	}
	None
}

fn is_identifier(name: &str) -> bool {
	let mut chars = name.chars();
	chars.next().is_some_and(|c| c.is_ascii_lowercase() || c == '_')
		&& chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
