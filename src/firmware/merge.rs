use std::{
    io,
    path::{Path, PathBuf},
};

use log::info;

/// Where the LittleFS image lives in flash
pub const FILESYSTEM_OFFSET: u32 = 0x310000;

const BOOTLOADER_OFFSET: u32 = 0x1000;
const PARTITIONS_OFFSET: u32 = 0x8000;
const APP_OFFSET: u32 = 0x10000;

/// Binaries a CI job picks up from the build directory
const SEPARATE_BINARIES: [&str; 3] = ["firmware.bin", "partitions.bin", "bootloader.bin"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlashImage {
    pub offset: u32,
    pub path: PathBuf,
}

impl FlashImage {
    pub fn new(offset: u32, path: impl Into<PathBuf>) -> Self {
        FlashImage {
            offset,
            path: path.into(),
        }
    }

    fn push_args(&self, args: &mut Vec<String>) {
        args.push(format!("{:#x}", self.offset));
        args.push(self.path.display().to_string());
    }
}

/// One flashable file holding bootloader, partition table, app and filesystem
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeBinPlan {
    pub chip: String,
    pub output: PathBuf,
    /// Bootloader, partition table and friends, in flash order
    pub extra_images: Vec<FlashImage>,
    pub app: FlashImage,
    pub filesystem: FlashImage,
}

impl MergeBinPlan {
    /// The usual ESP32 layout of the images in `build_dir`
    pub fn for_build_dir(build_dir: &Path, output: impl Into<PathBuf>) -> Self {
        MergeBinPlan {
            chip: "ESP32".to_string(),
            output: output.into(),
            extra_images: vec![
                FlashImage::new(BOOTLOADER_OFFSET, build_dir.join("bootloader.bin")),
                FlashImage::new(PARTITIONS_OFFSET, build_dir.join("partitions.bin")),
            ],
            app: FlashImage::new(APP_OFFSET, build_dir.join("firmware.bin")),
            filesystem: FlashImage::new(FILESYSTEM_OFFSET, build_dir.join("littlefs.bin")),
        }
    }

    pub fn with_extra_image(mut self, image: FlashImage) -> Self {
        self.extra_images.push(image);
        self
    }

    pub fn esptool_args(&self) -> Vec<String> {
        let mut args = vec![
            "--chip".to_string(),
            self.chip.clone(),
            "merge_bin".to_string(),
            "-o".to_string(),
            self.output.display().to_string(),
            "--flash_size=keep".to_string(),
        ];

        for image in &self.extra_images {
            image.push_args(&mut args);
        }
        self.app.push_args(&mut args);
        self.filesystem.push_args(&mut args);

        args
    }
}

/// Write a merged image from address zero
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlashPlan {
    pub image: FlashImage,
}

impl FlashPlan {
    pub fn merged(path: impl Into<PathBuf>) -> Self {
        FlashPlan {
            image: FlashImage::new(0, path),
        }
    }

    pub fn esptool_args(&self) -> Vec<String> {
        let mut args = vec!["write_flash".to_string()];
        self.image.push_args(&mut args);
        args
    }
}

/// Copy the app, partition table and bootloader out of the build directory
pub fn collect_binaries(build_dir: &Path, dest: &Path) -> io::Result<Vec<PathBuf>> {
    let mut copied = Vec::new();

    for name in SEPARATE_BINARIES {
        let target = dest.join(name);
        std::fs::copy(build_dir.join(name), &target)?;
        info!("Copied {}", target.display());
        copied.push(target);
    }

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_args() {
        let plan = MergeBinPlan::for_build_dir(Path::new(".pio/build/esp32"), "fullimage.bin")
            .with_extra_image(FlashImage::new(0xe000, "boot_app0.bin"));

        assert_eq!(
            vec![
                "--chip",
                "ESP32",
                "merge_bin",
                "-o",
                "fullimage.bin",
                "--flash_size=keep",
                "0x1000",
                ".pio/build/esp32/bootloader.bin",
                "0x8000",
                ".pio/build/esp32/partitions.bin",
                "0xe000",
                "boot_app0.bin",
                "0x10000",
                ".pio/build/esp32/firmware.bin",
                "0x310000",
                ".pio/build/esp32/littlefs.bin",
            ],
            plan.esptool_args()
        );
    }

    #[test]
    fn test_flash_args() {
        assert_eq!(
            vec!["write_flash", "0x0", "merged-flash.bin"],
            FlashPlan::merged("merged-flash.bin").esptool_args()
        );
    }

    #[test]
    fn test_collect_binaries() {
        let root = std::env::temp_dir().join(format!("antctl-collect-{}", std::process::id()));
        let build = root.join("build");
        let dest = root.join("out");
        std::fs::create_dir_all(&build).unwrap();
        std::fs::create_dir_all(&dest).unwrap();
        for name in SEPARATE_BINARIES {
            std::fs::write(build.join(name), name).unwrap();
        }

        let copied = collect_binaries(&build, &dest).unwrap();

        assert_eq!(3, copied.len());
        assert_eq!(
            "bootloader.bin",
            std::fs::read_to_string(dest.join("bootloader.bin")).unwrap()
        );
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_collect_missing_binary_fails() {
        let root = std::env::temp_dir().join(format!("antctl-missing-{}", std::process::id()));
        std::fs::create_dir_all(&root).unwrap();

        assert!(collect_binaries(&root, &root).is_err());
        std::fs::remove_dir_all(&root).ok();
    }
}
