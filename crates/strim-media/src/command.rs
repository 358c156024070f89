//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Where FFmpeg reads from or writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// A file on disk
    File(PathBuf),
    /// stdin for inputs, stdout for outputs
    Pipe,
}

impl Endpoint {
    fn as_arg(&self, output: bool) -> String {
        match self {
            Endpoint::File(path) => path.to_string_lossy().to_string(),
            Endpoint::Pipe if output => "pipe:1".to_string(),
            Endpoint::Pipe => "pipe:0".to_string(),
        }
    }
}

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input endpoint
    input: Endpoint,
    /// Further file inputs, numbered from 1 in `-map`
    extra_inputs: Vec<PathBuf>,
    /// Output endpoint
    output: Endpoint,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a file-to-file FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self::with_endpoints(
            Endpoint::File(input.as_ref().to_path_buf()),
            Endpoint::File(output.as_ref().to_path_buf()),
        )
    }

    /// Create a command that writes its output to stdout.
    pub fn to_pipe(input: impl AsRef<Path>) -> Self {
        Self::with_endpoints(Endpoint::File(input.as_ref().to_path_buf()), Endpoint::Pipe)
    }

    /// Create a command that reads its input from stdin.
    pub fn from_pipe(output: impl AsRef<Path>) -> Self {
        Self::with_endpoints(Endpoint::Pipe, Endpoint::File(output.as_ref().to_path_buf()))
    }

    fn with_endpoints(input: Endpoint, output: Endpoint) -> Self {
        Self {
            input,
            extra_inputs: Vec::new(),
            output,
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add another file input after the primary one.
    pub fn add_input(mut self, path: impl AsRef<Path>) -> Self {
        self.extra_inputs.push(path.as_ref().to_path_buf());
        self
    }

    /// Add input arguments (before -i).
    pub fn input_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Declare the stdin input as raw interleaved f32le PCM.
    pub fn raw_f32_input(self, sample_rate: u32, channels: u16) -> Self {
        self.input_args([
            "-f".to_string(),
            "f32le".to_string(),
            "-ar".to_string(),
            sample_rate.to_string(),
            "-ac".to_string(),
            channels.to_string(),
        ])
    }

    /// Write the output as raw interleaved f32le PCM.
    pub fn raw_f32_output(self, sample_rate: u32, channels: u16) -> Self {
        self.output_args([
            "-vn".to_string(),
            "-acodec".to_string(),
            "pcm_f32le".to_string(),
            "-ar".to_string(),
            sample_rate.to_string(),
            "-ac".to_string(),
            channels.to_string(),
            "-f".to_string(),
            "f32le".to_string(),
        ])
    }

    /// Set output muxer.
    pub fn format(self, muxer: impl Into<String>) -> Self {
        self.output_arg("-f").output_arg(muxer)
    }

    /// Select streams for the output, e.g. `0:a` or `1:0`.
    pub fn map(self, spec: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(spec)
    }

    /// Copy every stream without re-encoding.
    pub fn copy_streams(self) -> Self {
        self.output_args(["-map", "0", "-c", "copy"])
    }

    /// Drop all metadata inherited from the input.
    pub fn strip_metadata(self) -> Self {
        self.output_args(["-map_metadata", "-1"])
    }

    /// Set a container-level tag.
    pub fn metadata(self, key: &str, value: &str) -> Self {
        self.output_arg("-metadata").output_arg(format!("{key}={value}"))
    }

    /// Set a tag on the first audio stream.
    pub fn stream_metadata(self, key: &str, value: &str) -> Self {
        self.output_arg("-metadata:s:a:0")
            .output_arg(format!("{key}={value}"))
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        // Overwrite flag
        if self.overwrite {
            args.push("-y".to_string());
        }

        // Log level
        args.push("-v".to_string());
        args.push(self.log_level.clone());

        // No interactive prompts when reading stdin
        args.push("-nostdin".to_string());
        if self.input == Endpoint::Pipe {
            args.pop();
        }

        // Input args
        args.extend(self.input_args.clone());

        // Input
        args.push("-i".to_string());
        args.push(self.input.as_arg(false));
        for extra in &self.extra_inputs {
            args.push("-i".to_string());
            args.push(extra.to_string_lossy().to_string());
        }

        // Output args
        args.extend(self.output_args.clone());

        // Output
        args.push(self.output.as_arg(true));

        args
    }
}

/// Runner for FFmpeg commands with an optional timeout.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRunner {
    /// Timeout in seconds
    timeout_secs: Option<u64>,
}

impl FfmpegRunner {
    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Run a file-to-file FFmpeg command.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        self.execute(cmd, None).await.map(|_| ())
    }

    /// Run a command whose output is a pipe and return what it wrote to stdout.
    pub async fn run_capture(&self, cmd: &FfmpegCommand) -> MediaResult<Vec<u8>> {
        self.execute(cmd, None).await
    }

    /// Run a command whose input is a pipe, feeding it `input`.
    pub async fn run_with_input(&self, cmd: &FfmpegCommand, input: Vec<u8>) -> MediaResult<()> {
        self.execute(cmd, Some(input)).await.map(|_| ())
    }

    async fn execute(&self, cmd: &FfmpegCommand, input: Option<Vec<u8>>) -> MediaResult<Vec<u8>> {
        // Check FFmpeg exists
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let fut = spawn_and_wait(args, input);

        match self.timeout_secs {
            Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), fut).await {
                Ok(result) => result,
                Err(_) => {
                    // kill_on_drop reaps the child
                    warn!("FFmpeg timed out after {} seconds, killing process", secs);
                    Err(MediaError::Timeout(secs))
                }
            },
            None => fut.await,
        }
    }
}

async fn spawn_and_wait(args: Vec<String>, input: Option<Vec<u8>>) -> MediaResult<Vec<u8>> {
    let mut child = Command::new("ffmpeg")
        .args(&args)
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    // Feed stdin from a separate task so stdout/stderr keep draining
    let writer = match (input, child.stdin.take()) {
        (Some(bytes), Some(mut stdin)) => Some(tokio::spawn(async move {
            stdin.write_all(&bytes).await?;
            stdin.shutdown().await
        })),
        _ => None,
    };

    let output = child.wait_with_output().await?;

    let write_result = match writer {
        Some(handle) => handle
            .await
            .map_err(|e| MediaError::internal(format!("stdin writer panicked: {e}")))?,
        None => Ok(()),
    };

    if !output.status.success() {
        return Err(MediaError::ffmpeg_failed(
            "FFmpeg exited with non-zero status",
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
            output.status.code(),
        ));
    }

    write_result?;

    Ok(output.stdout)
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}
