use anyhow::{Context, Result};
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::CompressionConfig;
use crate::video::EncodeSettings;

/// Shell flavour of the generated script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptPlatform {
    Unix,
    Windows,
}

impl ScriptPlatform {
    /// Platform the binary was built for
    pub fn current() -> Self {
        if cfg!(windows) {
            ScriptPlatform::Windows
        } else {
            ScriptPlatform::Unix
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            ScriptPlatform::Unix => "compress_all.sh",
            ScriptPlatform::Windows => "compress_all.bat",
        }
    }
}

/// Renders a standalone script running the same encoder invocation as the batch driver
#[derive(Debug, Clone)]
pub struct ScriptGenerator {
    encoder: String,
    output_dir: String,
    extensions: Vec<String>,
    settings: EncodeSettings,
}

impl ScriptGenerator {
    pub fn new(config: &CompressionConfig) -> Self {
        Self {
            encoder: config.encoder.clone(),
            output_dir: config.output_dir.display().to_string(),
            extensions: config.supported_extensions.clone(),
            settings: EncodeSettings::from(config),
        }
    }

    pub fn render(&self, platform: ScriptPlatform) -> String {
        match platform {
            ScriptPlatform::Unix => self.render_unix(),
            ScriptPlatform::Windows => self.render_windows(),
        }
    }

    fn render_unix(&self) -> String {
        let globs: Vec<String> = self.extensions.iter().map(|e| format!("*.{}", e)).collect();
        let command = self.settings.command_line(
            &self.encoder,
            "$f",
            &format!("{}/$f", self.output_dir),
        );

        let mut script = String::new();
        script.push_str("#!/bin/bash\n");
        script.push_str(&format!(
            "# Batch video compression, generated {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        script.push_str(&format!(
            "# {}x{} square, crf {}\n\n",
            self.settings.resolution, self.settings.resolution, self.settings.crf
        ));
        script.push_str(&format!("mkdir -p \"{}\"\n\n", self.output_dir));
        script.push_str(&format!("for f in {}; do\n", globs.join(" ")));
        script.push_str("    [ -e \"$f\" ] || continue\n");
        script.push_str("    echo \"Compressing $f\"\n");
        script.push_str(&format!("    {}\n", command));
        script.push_str("done\n\n");
        script.push_str("echo \"Done\"\n");
        script
    }

    fn render_windows(&self) -> String {
        let globs: Vec<String> = self.extensions.iter().map(|e| format!("*.{}", e)).collect();
        let output_dir = self.output_dir.replace('/', "\\");
        let command = self.settings.command_line(
            &self.encoder,
            "%%f",
            &format!("{}\\%%f", output_dir),
        );

        let mut script = String::new();
        script.push_str("@echo off\r\n");
        script.push_str(&format!(
            "REM Batch video compression, generated {}\r\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        script.push_str(&format!(
            "REM {}x{} square, crf {}\r\n\r\n",
            self.settings.resolution, self.settings.resolution, self.settings.crf
        ));
        script.push_str(&format!(
            "if not exist \"{}\" mkdir \"{}\"\r\n\r\n",
            output_dir, output_dir
        ));
        script.push_str(&format!("for %%f in ({}) do (\r\n", globs.join(" ")));
        script.push_str("    echo Compressing %%f\r\n");
        script.push_str(&format!("    {}\r\n", command));
        script.push_str(")\r\n\r\n");
        script.push_str("echo Done\r\n");
        script.push_str("pause\r\n");
        script
    }

    /// Write the script into `dir`; on Unix it is made executable
    pub async fn write(&self, dir: &Path, platform: ScriptPlatform) -> Result<PathBuf> {
        let path = dir.join(platform.file_name());
        tokio::fs::write(&path, self.render(platform))
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if platform == ScriptPlatform::Unix {
                tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).await?;
            }
        }

        info!("📝 Script written to: {}", path.display());
        Ok(path)
    }
}
