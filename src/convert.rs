use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

use crate::error::{io_err, Result, ShiftError};

const TEMP_STEM: &str = "audio_file";
const INPUT_PLACEHOLDER: &str = "{input}";
const OUTPUT_PLACEHOLDER: &str = "{output}";
const STICKER_EXTENSION: &str = "webp";
const RASTER_EXTENSION: &str = "png";

/// External transcoder invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConverter {
    pub program: String,
    pub target_extension: String,
    /// Arguments; `{input}` and `{output}` are replaced by the file paths
    pub args: Vec<String>,
}

impl Default for AudioConverter {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            target_extension: "mp3".to_string(),
            args: ["-nostdin", "-y", "-loglevel", "error", "-i", INPUT_PLACEHOLDER, OUTPUT_PLACEHOLDER]
                .iter()
                .map(|arg| arg.to_string())
                .collect(),
        }
    }
}

impl AudioConverter {
    fn command(&self, input: &Path, output: &Path) -> Command {
        let mut command = Command::new(&self.program);
        for arg in &self.args {
            let arg: OsString = match arg.as_str() {
                INPUT_PLACEHOLDER => input.as_os_str().to_owned(),
                OUTPUT_PLACEHOLDER => output.as_os_str().to_owned(),
                other => other.into(),
            };
            command.arg(arg);
        }
        command.stdin(Stdio::null());
        command
    }

    fn is_target(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.target_extension))
    }

    /// Transcode every file of a batch to the target extension, keeping the
    /// (already canonical) base name.
    ///
    /// Files already in the target format pass through untouched. A failing
    /// transcoder is logged and the file is handed back unconverted.
    pub fn to_standard_audio(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
        if paths.is_empty() {
            warn!("The list of files to convert to \".{}\" is empty", self.target_extension);
            return Ok(Vec::new());
        }

        let mut converted = Vec::with_capacity(paths.len());
        for path in paths {
            if self.is_target(path) {
                converted.push(path.clone());
                continue;
            }
            converted.push(self.convert_one(path)?);
        }

        info!(count = converted.len(), target = %self.target_extension, "audio batch converted");
        Ok(converted)
    }

    fn convert_one(&self, path: &Path) -> Result<PathBuf> {
        let parent = path.parent().unwrap_or_else(|| Path::new(""));

        // Neutral name so the transcoder never sees the original file name
        let temp = match path.extension() {
            Some(ext) => parent.join(TEMP_STEM).with_extension(ext),
            None => parent.join(TEMP_STEM),
        };
        let temp_output = temp.with_extension(&self.target_extension);
        if temp_output.exists() {
            warn!(file = %temp_output.display(), "removing leftover transcoder output");
            fs::remove_file(&temp_output).map_err(io_err("remove", &temp_output))?;
        }
        fs::rename(path, &temp).map_err(io_err("rename", path))?;

        match self.command(&temp, &temp_output).status() {
            Ok(status) if status.success() => {
                debug!(file = %path.display(), "transcoder finished");
            }
            Ok(status) => {
                warn!(file = %path.display(), code = ?status.code(), "{} exited with a failure status", self.program);
            }
            Err(err) => {
                warn!(file = %path.display(), error = %err, "could not run {}", self.program);
            }
        }

        if !temp_output.exists() {
            warn!(file = %path.display(), "no converted output, keeping the original file");
            fs::rename(&temp, path).map_err(io_err("restore", &temp))?;
            return Ok(path.to_path_buf());
        }

        let target = path.with_extension(&self.target_extension);
        fs::rename(&temp_output, &target).map_err(io_err("rename", &temp_output))?;
        fs::remove_file(&temp).map_err(io_err("remove", &temp))?;
        Ok(target)
    }
}

/// Re-encode one webp sticker as png (alpha kept) and delete the webp
pub fn webp_to_png(path: &Path) -> Result<PathBuf> {
    let image = image::open(path).map_err(|source| ShiftError::Image {
        path: path.to_path_buf(),
        source,
    })?;

    let target = path.with_extension(RASTER_EXTENSION);
    image::DynamicImage::ImageRgba8(image.to_rgba8())
        .save_with_format(&target, ImageFormat::Png)
        .map_err(|source| ShiftError::Image {
            path: target.clone(),
            source,
        })?;

    fs::remove_file(path).map_err(io_err("remove", path))?;
    debug!(from = %path.display(), to = %target.display(), "sticker converted");
    Ok(target)
}

/// Convert the webp entries of a batch, passing other images through
pub fn stickers_to_png(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    paths
        .iter()
        .map(|path| {
            let is_sticker = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(STICKER_EXTENSION));
            if is_sticker {
                webp_to_png(path)
            } else {
                Ok(path.clone())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    fn converter(program: &str, args: &[&str]) -> AudioConverter {
        AudioConverter {
            program: program.to_string(),
            target_extension: "mp3".to_string(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }

    #[test]
    fn empty_batch_returns_empty() {
        let out = AudioConverter::default().to_standard_audio(&[]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn target_format_passes_through_untouched() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("2023-01-01_10-00-00_WhatsApp_0001.mp3");
        fs::write(&file, b"already mp3").unwrap();

        let out = converter("false", &[]).to_standard_audio(&[file.clone()]).unwrap();
        assert_eq!(out, vec![file.clone()]);
        assert_eq!(fs::read(&file).unwrap(), b"already mp3");
    }

    #[cfg(unix)]
    #[test]
    fn converts_and_keeps_the_canonical_name() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("2023-01-01_10-00-00_WhatsApp 0002 (copy).opus");
        fs::write(&file, b"voice").unwrap();

        let out = converter("cp", &["{input}", "{output}"]).to_standard_audio(&[file.clone()]).unwrap();
        let expected = dir.path().join("2023-01-01_10-00-00_WhatsApp 0002 (copy).mp3");
        assert_eq!(out, vec![expected.clone()]);
        assert_eq!(fs::read(&expected).unwrap(), b"voice");
        assert!(!file.exists());
        assert!(!dir.path().join("audio_file.opus").exists());
        assert!(!dir.path().join("audio_file.mp3").exists());
    }

    #[cfg(unix)]
    #[test]
    fn failing_transcoder_keeps_the_original() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("2023-01-01_10-00-00_track.m4a");
        fs::write(&file, b"music").unwrap();

        let out = converter("false", &[]).to_standard_audio(&[file.clone()]).unwrap();
        assert_eq!(out, vec![file.clone()]);
        assert_eq!(fs::read(&file).unwrap(), b"music");
        assert!(!dir.path().join("audio_file.m4a").exists());
    }

    #[cfg(unix)]
    #[test]
    fn leftover_output_is_not_mistaken_for_a_conversion() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("audio_file.mp3"), b"stale leftover").unwrap();
        let file = dir.path().join("2023-01-01_10-00-00_track.m4a");
        fs::write(&file, b"precious music").unwrap();

        let out = converter("false", &[]).to_standard_audio(&[file.clone()]).unwrap();
        assert_eq!(out, vec![file.clone()]);
        assert_eq!(fs::read(&file).unwrap(), b"precious music");
        assert!(!dir.path().join("2023-01-01_10-00-00_track.mp3").exists());
        assert!(!dir.path().join("audio_file.mp3").exists());
    }

    #[test]
    fn missing_transcoder_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("clip.ogg");
        fs::write(&file, b"ogg").unwrap();

        let out = converter("definitely-not-a-transcoder", &["{input}", "{output}"])
            .to_standard_audio(&[file.clone()])
            .unwrap();
        assert_eq!(out, vec![file.clone()]);
        assert!(file.exists());
    }

    #[test]
    fn webp_sticker_becomes_png_with_alpha() {
        let dir = TempDir::new().unwrap();
        let sticker = dir.path().join("STK-20230101-WA0003.webp");
        let pixels = RgbaImage::from_pixel(4, 4, Rgba([200, 10, 10, 128]));
        image::DynamicImage::ImageRgba8(pixels)
            .save_with_format(&sticker, ImageFormat::WebP)
            .unwrap();

        let out = stickers_to_png(&[sticker.clone()]).unwrap();
        let png = dir.path().join("STK-20230101-WA0003.png");
        assert_eq!(out, vec![png.clone()]);
        assert!(!sticker.exists());

        let decoded = image::open(&png).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0), &Rgba([200, 10, 10, 128]));
    }

    #[test]
    fn unreadable_sticker_is_an_image_error() {
        let dir = TempDir::new().unwrap();
        let sticker = dir.path().join("broken.webp");
        fs::write(&sticker, b"not an image").unwrap();

        let err = webp_to_png(&sticker).unwrap_err();
        assert!(matches!(err, ShiftError::Image { .. }));
        assert!(sticker.exists());
    }
}
