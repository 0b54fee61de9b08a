use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

/// Overrides every other search location when set.
const ASSETS_ENV: &str = "RIPPER_ASSETS_DIR";

#[derive(Debug, Clone)]
pub struct OcrAssets {
	pub detection: PathBuf,
	pub recognition: PathBuf,
	pub charset: PathBuf,
}

/// Folders that may hold the asset folders, most specific first.
fn candidate_roots(configured: Option<&Path>) -> Vec<PathBuf> {
	let mut candidates: Vec<PathBuf> = Vec::new();
	if let Some(dir) = std::env::var_os(ASSETS_ENV) {
		candidates.push(PathBuf::from(dir));
	}
	if let Some(dir) = configured {
		candidates.push(dir.to_path_buf());
	}
	if let Ok(exe) = std::env::current_exe()
		&& let Some(dir) = exe.parent()
	{
		candidates.push(dir.to_path_buf());
	}
	if let Ok(cwd) = std::env::current_dir() {
		candidates.push(cwd);
	}
	// Workspace root, for `cargo run` from another directory.
	#[cfg(debug_assertions)]
	candidates.push(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(".."));
	candidates
}

/// Accept either a root containing `<name>/` or the `<name>/` folder itself.
fn normalize_dir(dir: PathBuf, name: &str, marker: &str) -> PathBuf {
	if dir.join(marker).is_file() { dir } else { dir.join(name) }
}

fn searched(tried: Vec<PathBuf>) -> String {
	tried
		.into_iter()
		.map(|p| format!("  - {}", p.display()))
		.collect::<Vec<_>>()
		.join("\n")
}

fn find_ocr_assets(roots: Vec<PathBuf>, lang_code: &str) -> Result<OcrAssets> {
	let recognition_name = format!("{lang_code}_recognition.mnn");
	let charset_name = format!("{lang_code}_charset.txt");

	let mut tried = Vec::new();
	for base in roots {
		let ocr_dir = normalize_dir(base, "ocr", "detection.mnn");
		let detection = ocr_dir.join("detection.mnn");
		let recognition = ocr_dir.join(&recognition_name);
		let charset = ocr_dir.join(&charset_name);

		if detection.is_file() && recognition.is_file() && charset.is_file() {
			return Ok(OcrAssets { detection, recognition, charset });
		}
		tried.push(ocr_dir);
	}

	bail!(
		"OCR model files not found. Expected these files:\n  - ocr/detection.mnn\n  - ocr/{recognition_name}\n  - ocr/{charset_name}\n\nSearched in:\n{}\n\nFix: copy the 'ocr/' folder next to the executable (or set {ASSETS_ENV} to the folder that contains it).",
		searched(tried)
	)
}

fn find_anchor_dir(roots: Vec<PathBuf>) -> Result<PathBuf> {
	let mut tried = Vec::new();
	for base in roots {
		let dir = normalize_dir(base, "anchors", "options_menu.png");
		if dir.is_dir() {
			return Ok(dir);
		}
		tried.push(dir);
	}

	bail!(
		"anchor folder not found. Searched in:\n{}\n\nFix: copy the 'anchors/' folder next to the executable (or set {ASSETS_ENV} to the folder that contains it).",
		searched(tried)
	)
}

/// Resolve OCR model paths, both when running from the repo and from a packaged binary.
pub fn resolve_ocr_assets(configured: Option<&Path>, lang_code: &str) -> Result<OcrAssets> {
	find_ocr_assets(candidate_roots(configured), lang_code)
}

/// Resolve the folder of `<anchor>.png` snapshots.
pub fn resolve_anchor_dir(configured: Option<&Path>) -> Result<PathBuf> {
	find_anchor_dir(candidate_roots(configured))
}

#[cfg(test)]
mod tests {
	use std::fs;

	use super::*;

	fn scratch(name: &str) -> PathBuf {
		let dir = std::env::temp_dir().join(format!("ripper-assets-{}-{name}", std::process::id()));
		let _ = fs::remove_dir_all(&dir);
		fs::create_dir_all(&dir).unwrap();
		dir
	}

	#[test]
	fn ocr_folder_or_its_parent_both_work() {
		let root = scratch("ocr");
		let ocr = root.join("ocr");
		fs::create_dir_all(&ocr).unwrap();
		for file in ["detection.mnn", "latin_recognition.mnn", "latin_charset.txt"] {
			fs::write(ocr.join(file), b"").unwrap();
		}

		let from_root = find_ocr_assets(vec![root.clone()], "latin").unwrap();
		assert_eq!(from_root.recognition, ocr.join("latin_recognition.mnn"));
		let direct = find_ocr_assets(vec![ocr.clone()], "latin").unwrap();
		assert_eq!(direct.charset, ocr.join("latin_charset.txt"));

		let err = find_ocr_assets(vec![root.clone()], "cyrillic").unwrap_err().to_string();
		assert!(err.contains("cyrillic_recognition.mnn"));
		assert!(err.contains(&ocr.display().to_string()));
		fs::remove_dir_all(root).unwrap();
	}

	#[test]
	fn first_root_with_anchors_wins() {
		let empty = scratch("anchors-empty");
		let root = scratch("anchors");
		fs::create_dir_all(root.join("anchors")).unwrap();

		assert_eq!(find_anchor_dir(vec![empty.clone(), root.clone()]).unwrap(), root.join("anchors"));
		assert!(find_anchor_dir(vec![empty.clone()]).is_err());
		fs::remove_dir_all(empty).unwrap();
		fs::remove_dir_all(root).unwrap();
	}
}
