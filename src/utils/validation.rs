use crate::config::{MAX_LINK_SECONDS, MIN_LINK_SECONDS};
use image::ImageFormat;
use std::path::Path;

/// Extensions accepted for uploaded originals, compared case-insensitively
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validates file size against maximum limit
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ValidationError> {
    if size == 0 {
        return Err(ValidationError {
            code: "EMPTY_FILE",
            message: "The submitted file is empty.".to_string(),
        });
    }
    if size > max_size {
        return Err(ValidationError {
            code: "FILE_TOO_LARGE",
            message: format!(
                "File size {} bytes exceeds maximum allowed {} bytes ({} MB)",
                size,
                max_size,
                max_size / 1024 / 1024
            ),
        });
    }
    Ok(())
}

/// Returns the lower-cased extension when it is on the image allow-list
pub fn validate_image_extension(filename: &str) -> Result<String, ValidationError> {
    // Only the last path component matters; clients may send full paths
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if name.is_empty() {
        return Err(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename cannot be empty".to_string(),
        });
    }

    let ext = name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    let ext_lower = ext.to_lowercase();

    if ALLOWED_IMAGE_EXTENSIONS.contains(&ext_lower.as_str()) {
        Ok(ext_lower)
    } else {
        Err(ValidationError {
            code: "INVALID_EXTENSION",
            message: format!("{} extension is not supported.", ext),
        })
    }
}

/// Checks that the bytes really are a JPEG or PNG image with sane dimensions
pub fn verify_image_content(data: &[u8]) -> Result<ImageFormat, ValidationError> {
    let invalid = || ValidationError {
        code: "INVALID_IMAGE",
        message: "Upload a valid image. The file you uploaded was either not an image or a corrupted image.".to_string(),
    };

    let format = image::guess_format(data).map_err(|_| invalid())?;
    if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
        return Err(invalid());
    }

    let (width, height) = image::io::Reader::with_format(std::io::Cursor::new(data), format)
        .into_dimensions()
        .map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }

    Ok(format)
}

/// Full validation pipeline for uploaded originals. Returns the extension to store under.
pub fn validate_upload(
    filename: &str,
    data: &[u8],
    max_size: usize,
) -> Result<String, ValidationError> {
    let ext = validate_image_extension(filename)?;
    validate_file_size(data.len(), max_size)?;
    verify_image_content(data)?;
    Ok(ext)
}

/// Range check for the lifetime of a binary link
pub fn validate_exist_seconds(exist_seconds: i64) -> Result<i32, ValidationError> {
    if !(MIN_LINK_SECONDS..=MAX_LINK_SECONDS).contains(&exist_seconds) {
        return Err(ValidationError {
            code: "INVALID_EXIST_SECONDS",
            message: format!(
                "exist_seconds must be between {} and {} (got {})",
                MIN_LINK_SECONDS, MAX_LINK_SECONDS, exist_seconds
            ),
        });
    }
    // bounds above fit comfortably in i32
    Ok(exist_seconds as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageOutputFormat, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut out = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut out), ImageOutputFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_validate_file_size() {
        assert!(validate_file_size(1024, 2048).is_ok());
        assert!(validate_file_size(2048, 2048).is_ok());
        assert!(validate_file_size(2049, 2048).is_err());
        assert_eq!(validate_file_size(0, 2048).unwrap_err().code, "EMPTY_FILE");
    }

    #[test]
    fn test_validate_image_extension() {
        assert_eq!(validate_image_extension("photo.jpg").unwrap(), "jpg");
        assert_eq!(validate_image_extension("photo.JPEG").unwrap(), "jpeg");
        assert_eq!(validate_image_extension("photo.PnG").unwrap(), "png");
        assert_eq!(validate_image_extension("../../etc/a.png").unwrap(), "png");

        let err = validate_image_extension("anim.gif").unwrap_err();
        assert_eq!(err.code, "INVALID_EXTENSION");
        assert_eq!(err.message, "gif extension is not supported.");

        assert!(validate_image_extension("noext").is_err());
        assert!(validate_image_extension("").is_err());
    }

    #[test]
    fn test_verify_image_content() {
        assert_eq!(
            verify_image_content(&png_bytes(4, 3)).unwrap(),
            ImageFormat::Png
        );
        assert!(verify_image_content(b"definitely not an image").is_err());
        // GIF magic is a real image format but not on the allow-list
        assert!(verify_image_content(b"GIF89a\x01\x00\x01\x00").is_err());
    }

    #[test]
    fn test_validate_upload_checks_extension_before_content() {
        let err = validate_upload("x.bmp", b"garbage", 1024).unwrap_err();
        assert_eq!(err.code, "INVALID_EXTENSION");

        let err = validate_upload("x.png", b"garbage", 1024).unwrap_err();
        assert_eq!(err.code, "INVALID_IMAGE");

        assert_eq!(validate_upload("x.PNG", &png_bytes(2, 2), 1 << 20).unwrap(), "png");
    }

    #[test]
    fn test_validate_exist_seconds() {
        assert_eq!(validate_exist_seconds(300).unwrap(), 300);
        assert_eq!(validate_exist_seconds(30_000).unwrap(), 30_000);
        for bad in [i64::MIN, -1, 0, 299, 30_001, i64::MAX] {
            assert!(validate_exist_seconds(bad).is_err(), "{} accepted", bad);
        }
    }
}
