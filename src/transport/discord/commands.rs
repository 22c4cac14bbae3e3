use serde_json::json;

use super::types::{CommandOptionType, CommandType};

const SUB_COMMANDS: [(&str, &str); 3] = [
    ("status", "Check the status of the server"),
    ("start", "Start the server, if it isn't running"),
    ("stop", "Stop the server, if it is running"),
];

/// The guild slash command exposing `status`, `start` and `stop`.
pub fn build_game_command(command_name: &str) -> serde_json::Value {
    let options: Vec<serde_json::Value> = SUB_COMMANDS
        .iter()
        .map(|(name, description)| {
            json!({
                "name": name,
                "description": description,
                "type": CommandOptionType::SubCommand as u8,
            })
        })
        .collect();

    json!({
        "name": command_name,
        "type": CommandType::ChatInput as u8,
        "description": "Game server commands",
        "default_permission": false,
        "options": options,
    })
}

/// Name of the first option of an application-command interaction.
///
/// Returns an empty string when the command carries no options so that the
/// router sends it down the fallback path.
pub fn extract_sub_command(data: Option<&serde_json::Value>) -> String {
    data.and_then(|d| d.get("options"))
        .and_then(serde_json::Value::as_array)
        .and_then(|opts| opts.first())
        .and_then(|opt| opt.get("name"))
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string()
}
