//! ffmpeg argument builders for each stage.

use crate::job::Stage;
use crate::transcoder::EncodeCommand;
use reelstream_core::Resolution;
use std::path::Path;
use std::time::Duration;

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// `HH:MM:SS` seek position.
fn timestamp(offset: Duration) -> String {
    let secs = offset.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Extract a single frame at `offset` as a PNG.
pub fn thumbnail_command(input: &Path, output: &Path, offset: Duration) -> EncodeCommand {
    let args = vec![
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-y".to_string(),
        "-ss".to_string(),
        timestamp(offset),
        "-i".to_string(),
        path_arg(input),
        "-frames:v".to_string(),
        "1".to_string(),
        path_arg(output),
    ];

    EncodeCommand::new(Stage::Thumbnail, args, output)
}

/// Scale the video to `resolution`, copying the audio stream as-is.
pub fn rendition_command(input: &Path, output: &Path, resolution: Resolution) -> EncodeCommand {
    let args = vec![
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-y".to_string(),
        "-i".to_string(),
        path_arg(input),
        "-vf".to_string(),
        format!("scale={}:{}", resolution.width(), resolution.height()),
        "-c:a".to_string(),
        "copy".to_string(),
        path_arg(output),
    ];

    EncodeCommand::new(Stage::Rendition(resolution), args, output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_formatting() {
        assert_eq!(timestamp(Duration::from_secs(10)), "00:00:10");
        assert_eq!(timestamp(Duration::from_secs(3725)), "01:02:05");
        assert_eq!(timestamp(Duration::ZERO), "00:00:00");
    }

    #[test]
    fn test_thumbnail_command() {
        let cmd = thumbnail_command(
            Path::new("/tmp/job/source.mov"),
            Path::new("/tmp/job/thumbnail.png"),
            Duration::from_secs(10),
        );
        assert_eq!(cmd.stage, Stage::Thumbnail);
        assert_eq!(cmd.output, Path::new("/tmp/job/thumbnail.png"));

        let joined = cmd.args.join(" ");
        assert!(joined.contains("-y -ss 00:00:10 -i /tmp/job/source.mov"));
        assert!(joined.ends_with("-frames:v 1 /tmp/job/thumbnail.png"));
    }

    #[test]
    fn test_rendition_command_scales_to_tier() {
        let cmd = rendition_command(
            Path::new("/tmp/job/source.mov"),
            Path::new("/tmp/job/rendition_360.mp4"),
            Resolution::P360,
        );
        assert_eq!(cmd.stage, Stage::Rendition(Resolution::P360));
        let joined = cmd.args.join(" ");
        assert!(joined.contains("-vf scale=640:360 -c:a copy"));

        let cmd = rendition_command(
            Path::new("in.mp4"),
            Path::new("out.mp4"),
            Resolution::P1080,
        );
        assert!(cmd.args.contains(&"scale=1920:1080".to_string()));
        assert_eq!(cmd.args.last().map(String::as_str), Some("out.mp4"));
    }
}
