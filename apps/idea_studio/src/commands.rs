//! Input lines typed at the prompt, mapped to session actions.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Explicit `/generate` or a plain line (the Enter shortcut).
    Generate(String),
    List,
    Select(usize),
    Close,
    Convert,
    Download,
    Health,
    Help,
    Quit,
    Invalid(String),
}

pub const HELP: &str = "\
Type an idea and press Enter to generate an image.
  /generate <idea>   same as typing the idea
  /list              show the gallery (newest first)
  /select <n>        open gallery item n
  /close, /back      close the open image
  /convert           convert the open image to a 3D model
  /download          save the open image to the download directory
  /health            check that the backend is reachable
  /help              show this help
  /quit, /exit       leave";

pub fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Command::Generate(trimmed.to_string());
    };

    let (name, argument) = match rest.split_once(char::is_whitespace) {
        Some((name, argument)) => (name, argument.trim()),
        None => (rest, ""),
    };

    match name.to_ascii_lowercase().as_str() {
        "generate" | "g" => Command::Generate(argument.to_string()),
        "list" | "ls" => Command::List,
        "select" | "open" => match argument.parse::<usize>() {
            Ok(position) if position > 0 => Command::Select(position),
            _ => Command::Invalid("usage: /select <n> (n starts at 1)".to_string()),
        },
        "close" | "back" => Command::Close,
        "convert" | "3d" => Command::Convert,
        "download" | "save" => Command::Download,
        "health" => Command::Health,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => Command::Invalid(format!("unknown command '/{other}'; try /help")),
    }
}
