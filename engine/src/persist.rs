//! Writing a finished review and its illustration to disk.
//!
//! Both files are named after the book title: `{stem}_review.txt` holds the
//! UTF-8 review text and `{stem}_illustration.png` the image. The stem is the
//! title with path separators, reserved characters and control characters
//! replaced by `_`, so a title can never point outside the output directory.
//!
//! Stems are cut to [`MAX_STEM_BYTES`] so the longest generated name still
//! fits the usual 255 byte file name limit.
//!
//! Each file is written to a hidden `.partial` sibling and renamed into place,
//! so a failed write never leaves a truncated file behind. The text file goes
//! first. When the image can't be written, the text file is removed again, so
//! a run leaves either both files or none.

use std::{
    ffi::OsString,
    fs,
    io::{self, Cursor},
    path::{Path, PathBuf},
};

use image::{ImageError, ImageFormat};
use log::{info, warn};
use thiserror::Error;

use crate::review::{Illustration, Review};

pub const REVIEW_SUFFIX: &str = "_review.txt";
pub const ILLUSTRATION_SUFFIX: &str = "_illustration.png";
pub const MAX_STEM_BYTES: usize = 200;
const PARTIAL_SUFFIX: &str = ".partial";

const RESERVED: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("The title {0:?} can't be used as a file name")]
    InvalidTitle(String),

    #[error("Couldn't write {}", path.display())]
    WriteReview {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Couldn't write {}", path.display())]
    WriteIllustration {
        path: PathBuf,
        #[source]
        source: ImageError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifacts {
    pub review_path: PathBuf,
    pub illustration_path: PathBuf,
}

pub fn file_stem(title: &str) -> Result<String, PersistError> {
    let replaced: String = title
        .chars()
        .map(|c| {
            if RESERVED.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    let stem = replaced.trim_matches(|c: char| c.is_whitespace() || c == '.');

    let mut end = stem.len().min(MAX_STEM_BYTES);
    while !stem.is_char_boundary(end) {
        end -= 1;
    }
    let stem = stem[..end].trim_end_matches(|c: char| c.is_whitespace() || c == '.');

    if stem.is_empty() || stem.chars().all(|c| c == '_') {
        return Err(PersistError::InvalidTitle(title.to_string()));
    }
    Ok(stem.to_string())
}

pub fn output_paths(dir: &Path, title: &str) -> Result<OutputArtifacts, PersistError> {
    let stem = file_stem(title)?;
    Ok(OutputArtifacts {
        review_path: dir.join(format!("{stem}{REVIEW_SUFFIX}")),
        illustration_path: dir.join(format!("{stem}{ILLUSTRATION_SUFFIX}")),
    })
}

pub fn save(
    dir: &Path,
    title: &str,
    review: &Review,
    illustration: &Illustration,
) -> Result<OutputArtifacts, PersistError> {
    let artifacts = output_paths(dir, title)?;

    write_atomically(&artifacts.review_path, review.text().as_bytes()).map_err(|source| {
        PersistError::WriteReview {
            path: artifacts.review_path.clone(),
            source,
        }
    })?;

    if let Err(source) = write_png(&artifacts.illustration_path, illustration) {
        remove_if_present(&artifacts.review_path);
        return Err(PersistError::WriteIllustration {
            path: artifacts.illustration_path,
            source,
        });
    }

    info!(
        "Wrote {} and {}",
        artifacts.review_path.display(),
        artifacts.illustration_path.display()
    );
    Ok(artifacts)
}

fn write_png(path: &Path, illustration: &Illustration) -> Result<(), ImageError> {
    let mut buf = Vec::new();
    illustration
        .image()
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(write_atomically(path, &buf)?)
}

fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let partial = partial_path(path);
    let result = fs::write(&partial, bytes).and_then(|()| fs::rename(&partial, path));
    if result.is_err() {
        remove_if_present(&partial);
    }
    result
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(PARTIAL_SUFFIX);
    path.with_file_name(name)
}

fn remove_if_present(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Couldn't remove {}: {e}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, RgbImage};
    use tempfile::TempDir;

    use super::*;

    fn illustration() -> Illustration {
        Illustration::new(DynamicImage::ImageRgb8(RgbImage::new(4, 4)))
    }

    #[test]
    fn plain_titles_are_kept() {
        assert_eq!(file_stem("Test Book").unwrap(), "Test Book");
        assert_eq!(file_stem("채식주의자").unwrap(), "채식주의자");
    }

    #[test]
    fn separators_and_reserved_chars_are_replaced() {
        assert_eq!(file_stem("../../etc/passwd").unwrap(), "_.._etc_passwd");
        assert_eq!(file_stem("What? A:B <C>").unwrap(), "What_ A_B _C_");
        assert_eq!(file_stem("tab\there").unwrap(), "tab_here");
        assert_eq!(file_stem(" Dots... ").unwrap(), "Dots");
    }

    #[test]
    fn unusable_titles_are_rejected() {
        for title in ["", "  ", "..", "/", "\\//"] {
            assert!(
                matches!(file_stem(title), Err(PersistError::InvalidTitle(_))),
                "{title:?} should be rejected"
            );
        }
    }

    #[test]
    fn long_titles_are_cut_at_a_char_boundary() {
        let stem = file_stem(&"가".repeat(85)).unwrap();
        assert!(stem.len() <= MAX_STEM_BYTES);
        assert_eq!(stem, "가".repeat(MAX_STEM_BYTES / 3));

        let stem = file_stem(&format!("{}. tail", "a".repeat(MAX_STEM_BYTES - 2))).unwrap();
        assert_eq!(stem, "a".repeat(MAX_STEM_BYTES - 2));
    }

    #[test]
    fn long_multibyte_title_is_saved() -> color_eyre::Result<()> {
        let dir = TempDir::new()?;
        let review = Review::new("REVIEW").unwrap();

        let artifacts = save(dir.path(), &"가".repeat(85), &review, &illustration())?;

        assert!(artifacts.review_path.exists());
        assert!(artifacts.illustration_path.exists());
        Ok(())
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn writes_both_files() -> color_eyre::Result<()> {
        let dir = TempDir::new()?;
        let review = Review::new("좋은 책입니다.").unwrap();

        let artifacts = save(dir.path(), "Test Book", &review, &illustration())?;

        assert_eq!(artifacts.review_path, dir.path().join("Test Book_review.txt"));
        assert_eq!(
            fs::read_to_string(&artifacts.review_path)?,
            "좋은 책입니다."
        );
        let written = image::open(&artifacts.illustration_path)?;
        assert_eq!((written.width(), written.height()), (4, 4));
        Ok(())
    }

    #[test]
    fn overwrites_existing_files() -> color_eyre::Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("Test Book_review.txt"), "old")?;

        let review = Review::new("new").unwrap();
        save(dir.path(), "Test Book", &review, &illustration())?;

        assert_eq!(
            fs::read_to_string(dir.path().join("Test Book_review.txt"))?,
            "new"
        );
        Ok(())
    }

    #[test]
    fn failed_review_write_skips_image() -> color_eyre::Result<()> {
        let dir = TempDir::new()?;
        fs::create_dir(dir.path().join("Test Book_review.txt"))?;

        let review = Review::new("REVIEW").unwrap();
        let err = save(dir.path(), "Test Book", &review, &illustration()).unwrap_err();

        assert!(matches!(err, PersistError::WriteReview { .. }));
        assert_eq!(entries(dir.path()), ["Test Book_review.txt"]);
        Ok(())
    }

    // The image bytes are fully on disk before the final rename fails.
    #[test]
    fn failed_image_write_leaves_nothing_behind() -> color_eyre::Result<()> {
        let dir = TempDir::new()?;
        fs::create_dir(dir.path().join("Test Book_illustration.png"))?;

        let review = Review::new("REVIEW").unwrap();
        let err = save(dir.path(), "Test Book", &review, &illustration()).unwrap_err();

        assert!(matches!(err, PersistError::WriteIllustration { .. }));
        assert_eq!(entries(dir.path()), ["Test Book_illustration.png"]);
        assert!(fs::read_dir(dir.path().join("Test Book_illustration.png"))?
            .next()
            .is_none());
        Ok(())
    }

    #[test]
    fn partial_file_sits_next_to_target() {
        assert_eq!(
            partial_path(Path::new("out/Test Book_illustration.png")),
            Path::new("out/.Test Book_illustration.png.partial")
        );
    }
}
