mod ffmpeg;

pub use ffmpeg::{FfmpegMediaProbe, FfmpegSegmenter, discover_segments, parse_duration};
