use anyhow::Result;
use std::io::{BufRead, Write};

use crate::config::CompressionConfig;
use crate::video::EncodeSettings;

/// What the user picked at the start-up prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    /// Compress every video in the directory now
    CompressAll,
    /// Write compress_all.sh / compress_all.bat
    GenerateScript,
    /// Print example command lines
    ShowExamples,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(MenuChoice::CompressAll),
            "2" => Some(MenuChoice::GenerateScript),
            "3" => Some(MenuChoice::ShowExamples),
            _ => None,
        }
    }
}

/// Print `message` and read one trimmed line. EOF yields an empty string.
pub fn prompt_line<R: BufRead, W: Write>(input: &mut R, output: &mut W, message: &str) -> Result<String> {
    write!(output, "{}", message)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Show the mode menu and read the choice; `None` for anything unrecognised
pub fn prompt_choice<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    config: &CompressionConfig,
) -> Result<Option<MenuChoice>> {
    writeln!(output, "Batch video compressor")?;
    writeln!(
        output,
        "  target: {}x{} square, {} preset {} crf {}, {} {}",
        config.resolution,
        config.resolution,
        config.video_codec,
        config.preset,
        config.crf,
        config.audio_codec,
        config.audio_bitrate
    )?;
    writeln!(output, "  output: {}/ (file names unchanged)", config.output_dir.display())?;
    writeln!(output)?;
    writeln!(output, "  1. Compress all videos in this directory")?;
    writeln!(output, "  2. Generate a batch script")?;
    writeln!(output, "  3. Show example commands")?;
    writeln!(output)?;

    let answer = prompt_line(input, output, "Choose (1/2/3): ")?;
    Ok(MenuChoice::parse(&answer))
}

/// Ask a yes/no question; only `y`/`yes` (any case) count as yes
pub fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<bool> {
    let answer = prompt_line(input, output, &format!("{} (y/n): ", question))?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

/// Example command lines for running the encoder by hand
pub fn example_commands(config: &CompressionConfig) -> String {
    let settings = EncodeSettings::from(config);
    let output_dir = config.output_dir.display();
    let mut text = String::new();

    text.push_str("Single file:\n");
    text.push_str(&format!(
        "  {}\n\n",
        settings.command_line(&config.encoder, "input.mp4", &format!("{}/input.mp4", output_dir))
    ));

    text.push_str("Every mp4 in the current directory (bash):\n");
    text.push_str(&format!(
        "  for f in *.mp4; do {}; done\n\n",
        settings.command_line(&config.encoder, "$f", &format!("{}/$f", output_dir))
    ));

    text.push_str("Every mp4 in the current directory (cmd.exe):\n");
    text.push_str(&format!(
        "  for %f in (*.mp4) do {}\n\n",
        settings.command_line(&config.encoder, "%f", &format!("{}\\%f", output_dir))
    ));

    let smaller = EncodeSettings {
        resolution: 480,
        crf: settings.crf.saturating_add(4),
        ..settings.clone()
    };
    text.push_str("Smaller output (480x480, higher crf):\n");
    text.push_str(&format!(
        "  {}\n\n",
        smaller.command_line(&config.encoder, "input.mp4", "output.mp4")
    ));

    text.push_str(&format!(
        "Inspect a file:\n  {} -v quiet -print_format json -show_entries format=duration,size:stream=width,height \"input.mp4\"\n\n",
        config.probe
    ));

    text.push_str("CRF: lower is higher quality and larger files; 18-28 is the usual range.\n");
    text
}
