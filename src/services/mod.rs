//! External collaborator services.

pub mod ytdlp;

pub use ytdlp::{
    parse_channel_metadata, parse_channel_videos, ChannelDump, ChannelMetadataExtractor,
    ExtractError, YtDlpExtractor,
};
