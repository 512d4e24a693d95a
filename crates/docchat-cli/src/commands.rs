//! Slash commands typed at the prompt

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Help,
    Status,
    Reconnect,
    Pause,
    Follow,
    Url(String),
    Model(String),
    Temperature(u8),
    System(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Question(String),
    Command(Command),
    Invalid(String),
}

pub fn parse_input(line: &str) -> Input {
    let Some(rest) = line.trim_start().strip_prefix('/') else {
        return Input::Question(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest.trim_end(), ""),
    };

    let command = match (name, arg) {
        ("quit" | "exit", _) => Command::Quit,
        ("help", _) => Command::Help,
        ("status", _) => Command::Status,
        ("reconnect", _) => Command::Reconnect,
        ("pause", _) => Command::Pause,
        ("follow", _) => Command::Follow,
        ("url", "") | ("model", "") | ("temperature", "") => {
            return Input::Invalid(format!("/{} needs a value", name));
        }
        ("url", url) => Command::Url(url.to_string()),
        ("model", model) => Command::Model(model.to_string()),
        ("temperature", raw) => match raw.parse::<u8>() {
            Ok(value) => Command::Temperature(value),
            Err(_) => return Input::Invalid(format!("temperature must be 0-100, got {:?}", raw)),
        },
        // An empty system message is allowed.
        ("system", text) => Command::System(text.to_string()),
        _ => return Input::Invalid(format!("unknown command /{}", name)),
    };
    Input::Command(command)
}

pub const HELP: &str = "\
/url <ws-url>        switch endpoint (reconnects)
/model <id>          change model for the next question
/temperature <0-100> change temperature for the next question
/system <text>       change system message (empty clears it)
/reconnect           open a fresh connection
/pause, /follow      stop or resume streaming output
/status              show session state
/quit                exit";
