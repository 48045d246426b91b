use url::Url;

const DISCORD_HOSTS: [&str; 2] = ["discord.com", "discordapp.com"];

fn channel_path_ids(link: &str) -> Option<Vec<u64>> {
    let url = Url::parse(link.trim()).ok()?;
    let host = url.host_str()?;
    let known_host = DISCORD_HOSTS
        .iter()
        .any(|base| host == *base || host.ends_with(&format!(".{}", base)));
    if !known_host {
        return None;
    }
    let mut segments = url.path_segments()?.filter(|segment| !segment.is_empty());
    if segments.next()? != "channels" {
        return None;
    }
    segments.map(|segment| segment.parse::<u64>().ok()).collect()
}

/// `https://discord.com/channels/<guild>/<channel>/<message>`
pub fn parse_message_link(link: &str) -> Option<(u64, u64, u64)> {
    match channel_path_ids(link)?.as_slice() {
        [guild, channel, message] => Some((*guild, *channel, *message)),
        _ => None,
    }
}

/// `https://discord.com/channels/<guild>/<channel>`
pub fn parse_channel_link(link: &str) -> Option<(u64, u64)> {
    match channel_path_ids(link)?.as_slice() {
        [guild, channel] | [guild, channel, _] => Some((*guild, *channel)),
        _ => None,
    }
}

pub fn message_link(guild_id: u64, channel_id: u64, message_id: u64) -> String {
    format!("https://discord.com/channels/{}/{}/{}", guild_id, channel_id, message_id)
}
