use super::error::InfrastructureError;
use crate::domain::error::DomainError;
use crate::domain::font_family::FontFamily;
use rusttype::Font;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;

/// Well-known locations of a generic sans face, tried when the configured
/// directory yields nothing.
pub const SYSTEM_FONT_PATHS: [&str; 6] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/local/share/fonts/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Font faces loaded from disk, keyed by lower-cased file name.
#[derive(Default)]
pub struct FontBook {
    faces: BTreeMap<String, Font<'static>>,
}

impl FontBook {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Faces from `dir`, or from the first system font found when the
    /// directory is missing or holds no usable face.
    pub async fn load(dir: &Path) -> Self {
        Self::load_with_fallback(dir, &SYSTEM_FONT_PATHS).await
    }

    async fn load_with_fallback(dir: &Path, fallback: &[&str]) -> Self {
        match Self::load_dir(dir).await {
            Ok(book) if !book.faces.is_empty() => return book,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Font directory unavailable")
            }
        }

        for path in fallback.iter().map(Path::new) {
            if let Some((name, font)) = read_face(path).await {
                tracing::info!(path = %path.display(), "Using system font face");
                let mut book = Self::empty();
                book.faces.insert(name, font);
                return book;
            }
        }
        tracing::warn!("No font faces available; text overlays cannot be rendered");
        Self::empty()
    }

    /// Loads every `.ttf`/`.otf` file directly inside `dir`. Files that cannot
    /// be read or parsed are skipped with a warning; a missing directory is an
    /// error.
    pub async fn load_dir(dir: &Path) -> Result<Self, InfrastructureError> {
        let mut faces = BTreeMap::new();
        let mut entries = fs::read_dir(dir).await.map_err(InfrastructureError::IoError)?;

        while let Some(entry) = entries.next_entry().await.map_err(InfrastructureError::IoError)? {
            let path = entry.path();
            let is_font = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "ttf" | "otf"))
                .unwrap_or(false);
            if !is_font {
                continue;
            }
            if let Some((name, font)) = read_face(&path).await {
                faces.insert(name, font);
            }
        }

        if faces.is_empty() {
            tracing::warn!(dir = %dir.display(), "No font faces found in directory");
        } else {
            tracing::info!(dir = %dir.display(), count = faces.len(), "Font faces loaded");
        }
        Ok(Self { faces })
    }

    /// Picks the first candidate file of `family` that was loaded, else the
    /// first loaded face by name.
    pub fn resolve(&self, family: FontFamily) -> Result<&Font<'static>, DomainError> {
        family
            .candidate_files()
            .iter()
            .find_map(|file| self.faces.get(&file.to_ascii_lowercase()))
            .or_else(|| self.faces.values().next())
            .ok_or(DomainError::FontUnavailable(family))
    }

    #[cfg(test)]
    pub(crate) fn insert(&mut self, file_name: &str, font: Font<'static>) {
        self.faces.insert(file_name.to_ascii_lowercase(), font);
    }
}

/// Reads and parses one face, keyed by its lower-cased file name. Failures
/// are logged and yield `None`.
async fn read_face(path: &Path) -> Option<(String, Font<'static>)> {
    let name = path.file_name()?.to_str()?.to_ascii_lowercase();
    let data = match fs::read(path).await {
        Ok(data) => data,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Skipping unreadable font file");
            return None;
        }
    };
    match Font::try_from_vec(data) {
        Some(font) => {
            tracing::debug!(path = %path.display(), "Loaded font face");
            Some((name, font))
        }
        None => {
            tracing::warn!(path = %path.display(), "Skipping file that is not a usable font");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = FontBook::load_dir(&dir.path().join("nope")).await;
        assert!(matches!(result, Err(InfrastructureError::IoError(_))));
    }

    #[tokio::test]
    async fn test_invalid_and_foreign_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Broken.ttf"), b"definitely not a font").unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"hello").unwrap();

        let book = FontBook::load_dir(dir.path()).await.unwrap();
        assert!(book.resolve(FontFamily::Inter).is_err());
    }

    #[tokio::test]
    async fn test_resolves_candidates_then_falls_back() {
        let system_font = SYSTEM_FONT_PATHS.iter().find_map(|path| std::fs::read(path).ok());
        let Some(data) = system_font else {
            eprintln!("no system font found; skipping");
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("DejaVuSans.TTF"), &data).unwrap();

        let book = FontBook::load_dir(dir.path()).await.unwrap();
        // Inter lists DejaVuSans.ttf as its generic face; Georgia only gets the fallback
        assert!(book.resolve(FontFamily::Inter).is_ok());
        assert!(book.resolve(FontFamily::Georgia).is_ok());
    }

    #[test]
    fn test_empty_book_cannot_resolve() {
        let book = FontBook::empty();
        assert_eq!(
            book.resolve(FontFamily::Georgia).err(),
            Some(DomainError::FontUnavailable(FontFamily::Georgia))
        );
    }

    #[tokio::test]
    async fn test_missing_directory_falls_back_to_a_system_face() {
        let Some(data) = SYSTEM_FONT_PATHS.iter().find_map(|path| std::fs::read(path).ok()) else {
            eprintln!("no system font found; skipping");
            return;
        };
        let scratch = tempfile::tempdir().unwrap();
        let system_face = scratch.path().join("Fallback.ttf");
        std::fs::write(&system_face, &data).unwrap();
        let fallback = ["/nonexistent/Arial.ttf", system_face.to_str().unwrap()];

        let book = FontBook::load_with_fallback(&scratch.path().join("fonts"), &fallback).await;
        assert!(book.resolve(FontFamily::Impact).is_ok());

        // An existing but empty directory falls back too
        let empty = tempfile::tempdir().unwrap();
        let book = FontBook::load_with_fallback(empty.path(), &fallback).await;
        assert!(book.resolve(FontFamily::Inter).is_ok());
    }

    #[tokio::test]
    async fn test_configured_faces_win_over_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Broken.ttf"), b"not a font").unwrap();

        // Nothing usable anywhere: the book stays empty instead of failing
        let book = FontBook::load_with_fallback(dir.path(), &["/nonexistent/DejaVuSans.ttf"]).await;
        assert_eq!(
            book.resolve(FontFamily::Inter).err(),
            Some(DomainError::FontUnavailable(FontFamily::Inter))
        );

        let Some(data) = SYSTEM_FONT_PATHS.iter().find_map(|path| std::fs::read(path).ok()) else {
            return;
        };
        std::fs::write(dir.path().join("Georgia.ttf"), &data).unwrap();
        let other = tempfile::tempdir().unwrap();
        let fallback_face = other.path().join("DejaVuSans.ttf");
        std::fs::write(&fallback_face, &data).unwrap();

        let fallback = [fallback_face.to_str().unwrap()];
        let book = FontBook::load_with_fallback(dir.path(), &fallback).await;
        assert_eq!(book.faces.keys().collect::<Vec<_>>(), vec!["georgia.ttf"]);
    }
}
