use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::time::Instant;

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tga", "tiff", "tif", "webp", "ico", "pnm", "pbm",
    "pgm", "ppm", "pam", "dds", "hdr", "exr", "ff", "qoi",
];

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn is_skipped_link(path: &Path, follow_links: bool) -> bool {
    !follow_links
        && fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
}

/// Frame files in spin order: the file list first (in listed order), then
/// each explicit path. Directories contribute their images sorted by name,
/// so `frame-01.jpg .. frame-36.jpg` come out as a sequence.
pub fn collect_frames(
    paths: &[PathBuf],
    file_list: Option<&PathBuf>,
    recursive: bool,
    follow_links: bool,
) -> Vec<PathBuf> {
    let start_time = Instant::now();
    let mut frames = Vec::new();

    if let Some(list_path) = file_list {
        match read_file_list(list_path) {
            Ok(listed) => frames.extend(
                listed
                    .into_iter()
                    .filter(|p| !is_skipped_link(p, follow_links) && p.is_file() && is_image_file(p)),
            ),
            Err(e) => log::warn!("Cannot read file list {:?}: {}", list_path, e),
        }
    }

    for path in paths {
        if is_skipped_link(path, follow_links) {
            continue;
        }
        if path.is_dir() {
            scan_dir(path, recursive, follow_links, &mut frames);
        } else if path.is_file() && is_image_file(path) {
            frames.push(path.clone());
        } else {
            log::warn!("Skipping {:?}: not an image file or directory", path);
        }
    }

    log::info!(
        "Scan complete in {:.2}s. Found {} frames.",
        start_time.elapsed().as_secs_f64(),
        frames.len()
    );
    frames
}

/// One path per line; blank lines and `#` comments are ignored.
fn read_file_list(list_path: &Path) -> io::Result<Vec<PathBuf>> {
    let reader = io::BufReader::new(fs::File::open(list_path)?);
    let mut paths = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        paths.push(PathBuf::from(trimmed));
    }
    Ok(paths)
}

fn scan_dir(dir: &Path, recursive: bool, follow_links: bool, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        log::warn!("Cannot read directory {:?}", dir);
        return;
    };
    let mut files = Vec::new();
    let mut subdirs = Vec::new();

    for entry in entries.filter_map(|e| e.ok()) {
        let Ok(ft) = entry.file_type() else {
            continue;
        };
        if ft.is_symlink() && !follow_links {
            continue;
        }
        let p = entry.path();
        if p.is_file() && is_image_file(&p) {
            files.push(p);
        } else if recursive && p.is_dir() {
            subdirs.push(p);
        }
    }

    files.sort();
    if !files.is_empty() {
        log::debug!("Scanning {:?}... ({} frames)", dir, files.len());
    }
    out.extend(files);

    if recursive {
        subdirs.sort();
        for sub in subdirs {
            scan_dir(&sub, true, follow_links, out);
        }
    }
}
