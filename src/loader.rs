use std::{
    fs,
    path::{Path, PathBuf},
};

use image::{DynamicImage, ImageError, ImageReader};

use crate::{
    config::allowed_file,
    error::{ForensicsError, Result},
};

pub struct ImageLoader;

impl ImageLoader {
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ForensicsError::InputNotFound(path.to_path_buf()));
        }

        // Content sniffing wins over the extension, so a mislabelled scan still decodes.
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        reader.decode().map_err(|e| match e {
            ImageError::Unsupported(err) => {
                ForensicsError::UnsupportedFormat(format!("{}: {}", path.display(), err))
            }
            ImageError::IoError(err) => ForensicsError::Io(err),
            other => ForensicsError::FeatureExtraction(format!(
                "cannot decode {}: {}",
                path.display(),
                other
            )),
        })
    }

    /// Lists images directly inside `folder`, sorted by file name.
    pub fn images_in_folder<P, S>(folder: P, extensions: &[S]) -> Result<Vec<PathBuf>>
    where
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        let folder = folder.as_ref();
        if !folder.is_dir() {
            return Err(ForensicsError::InputNotFound(folder.to_path_buf()));
        }

        let mut paths = Vec::new();
        for entry in fs::read_dir(folder)? {
            let entry = entry?;
            // Follows symlinks; dangling links are left out.
            if !entry.path().is_file() {
                continue;
            }

            let name = entry.file_name();
            if name.to_str().is_some_and(|n| allowed_file(n, extensions)) {
                paths.push(entry.path());
            }
        }

        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use image::ImageFormat;

    use super::*;
    use crate::{
        config::DEFAULT_EXTENSIONS,
        test_support::{synthetic_card, write_png},
    };

    #[test]
    fn test_images_in_folder_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.PNG", "a.jpg", "c.txt", "d.tiff", "noext"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested.png")).unwrap();

        let paths = ImageLoader::images_in_folder(dir.path(), &DEFAULT_EXTENSIONS).unwrap();
        let names = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect::<Vec<_>>();

        assert_eq!(names, vec!["a.jpg", "b.PNG", "d.tiff"]);
    }

    #[test]
    fn test_missing_folder_is_input_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let err = ImageLoader::images_in_folder(&missing, &DEFAULT_EXTENSIONS).unwrap_err();
        assert!(matches!(err, ForensicsError::InputNotFound(p) if p == missing));
    }

    #[test]
    fn test_corrupt_image_is_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        fs::write(&path, b"definitely not a png").unwrap();

        let err = ImageLoader::load_image(&path).unwrap_err();
        assert!(matches!(err, ForensicsError::FeatureExtraction(_)));
    }

    #[test]
    fn test_jpeg_with_png_name_decodes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        let card = synthetic_card(48, 32, 5);
        card.save_with_format(&path, ImageFormat::Jpeg).unwrap();

        let image = ImageLoader::load_image(&path).unwrap();
        assert_eq!((image.width(), image.height()), (48, 32));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_images_are_listed() {
        let dir = tempfile::tempdir().unwrap();
        let store = tempfile::tempdir().unwrap();
        let target = write_png(store.path(), "card.png", &synthetic_card(32, 24, 1));
        std::os::unix::fs::symlink(&target, dir.path().join("link.png")).unwrap();
        std::os::unix::fs::symlink(store.path().join("gone.png"), dir.path().join("dangling.png"))
            .unwrap();

        let paths = ImageLoader::images_in_folder(dir.path(), &DEFAULT_EXTENSIONS).unwrap();
        assert_eq!(paths, vec![dir.path().join("link.png")]);
        assert!(ImageLoader::load_image(&paths[0]).is_ok());
    }

    #[test]
    fn test_unknown_extension_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.xyz");
        fs::write(&path, b"data").unwrap();

        let err = ImageLoader::load_image(&path).unwrap_err();
        assert!(matches!(err, ForensicsError::UnsupportedFormat(_)));
    }
}
